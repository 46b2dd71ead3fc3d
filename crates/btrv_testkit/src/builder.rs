//! Byte-exact synthetic Btrieve files.
//!
//! [`FileBuilder`] lays out a v5 or v6 file: FCR (a redundant pair for v6),
//! PAT groups for v6, an optional ACS page, fixed data pages and variable
//! pages holding fragmented tails.

use crate::codes::attr;

/// Format generation of a built file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileVersion {
    /// Btrieve 5.x.
    V5,
    /// Btrieve 6.x.
    V6,
}

const KEY_DEFINITION_LEN: usize = 0x1E;
const V5_DEFINITIONS: usize = 0x110;
const V6_KAT: usize = 0x110;
const V6_DEFINITION_GAP: usize = 6;
const DATA_PAGE_HEADER: usize = 6;
const FRAGMENT_AREA: usize = 0x0C;
const MAX_FRAGMENTS_PER_PAGE: usize = 200;
const END_POINTER: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// One key segment definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpec {
    attributes: u16,
    data_type: u8,
    offset: u16,
    length: u16,
    null_value: u8,
    acs_number: u32,
}

impl SegmentSpec {
    /// A segment with an explicit (extended) data type.
    pub fn new(data_type: u8, offset: u16, length: u16) -> Self {
        Self {
            attributes: attr::EXTENDED_DATA_TYPE,
            data_type,
            offset,
            length,
            null_value: 0,
            acs_number: 0,
        }
    }

    /// A segment without an extended data type.
    pub fn legacy(offset: u16, length: u16) -> Self {
        Self {
            attributes: 0,
            ..Self::new(0, offset, length)
        }
    }

    /// Adds attribute bits.
    pub fn attributes(mut self, bits: u16) -> Self {
        self.attributes |= bits;
        self
    }

    /// Sets the null sentinel.
    pub fn null_value(mut self, value: u8) -> Self {
        self.null_value = value;
        self
    }

    /// Flags the segment as using ACS `number`.
    pub fn acs(mut self, number: u32) -> Self {
        self.attributes |= attr::NUMBERED_ACS;
        self.acs_number = number;
        self
    }

    fn encode(&self, segmented: bool) -> [u8; KEY_DEFINITION_LEN] {
        let mut def = [0u8; KEY_DEFINITION_LEN];
        let attributes = if segmented {
            self.attributes | attr::SEGMENTED
        } else {
            self.attributes
        };
        def[0x08..0x0A].copy_from_slice(&attributes.to_le_bytes());
        def[0x14..0x16].copy_from_slice(&self.offset.to_le_bytes());
        def[0x16..0x18].copy_from_slice(&self.length.to_le_bytes());
        def[0x19..0x1C].copy_from_slice(&packed_page(self.acs_number));
        def[0x1C] = self.data_type;
        def[0x1D] = self.null_value;
        def
    }
}

/// A key: one segment, or several for a composite key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    segments: Vec<SegmentSpec>,
}

impl KeySpec {
    /// A single-segment key.
    pub fn single(segment: SegmentSpec) -> Self {
        Self {
            segments: vec![segment],
        }
    }

    /// A composite key. Every segment but the last is written as segmented.
    pub fn composite(segments: Vec<SegmentSpec>) -> Self {
        assert!(!segments.is_empty(), "a key needs at least one segment");
        Self { segments }
    }

    /// The segments of the key.
    pub fn segments(&self) -> &[SegmentSpec] {
        &self.segments
    }

    fn encode(&self) -> Vec<u8> {
        let last = self.segments.len() - 1;
        self.segments
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.encode(i < last))
            .collect()
    }
}

/// A built file plus the layout facts tests assert against.
#[derive(Debug, Clone)]
pub struct BuiltFile {
    /// The file image.
    pub bytes: Vec<u8>,
    /// Identity offset of each record, in insertion order.
    pub record_offsets: Vec<u32>,
    /// Slot offsets placed on the free-record chain.
    pub free_offsets: Vec<u32>,
}

/// Builds synthetic Btrieve files.
#[derive(Debug, Clone)]
pub struct FileBuilder {
    version: FileVersion,
    page_length: u16,
    record_length: u16,
    physical_record_length: Option<u16>,
    variable: bool,
    log_key: bool,
    keys: Vec<KeySpec>,
    records: Vec<Vec<u8>>,
    acs: Option<(String, [u8; 256])>,
    duplicate_acs: bool,
    deleted_slots: Vec<usize>,
    fcr_usage: (u32, u32),
    pat_usage: (u32, u32),
    record_count: Option<u32>,
    vacant_fragment_slots: bool,
    index_pages: usize,
    fragment_payload: Option<usize>,
    corrupt_pointers: Vec<usize>,
    fragment_cycles: Vec<usize>,
}

impl FileBuilder {
    fn with_version(version: FileVersion, page_length: u16) -> Self {
        assert!(
            page_length >= 512 && page_length % 512 == 0,
            "page length must be a multiple of 512"
        );
        Self {
            version,
            page_length,
            record_length: 8,
            physical_record_length: None,
            variable: false,
            log_key: false,
            keys: Vec::new(),
            records: Vec::new(),
            acs: None,
            duplicate_acs: false,
            deleted_slots: Vec::new(),
            fcr_usage: (1, 0),
            pat_usage: (1, 0),
            record_count: None,
            vacant_fragment_slots: false,
            index_pages: 0,
            fragment_payload: None,
            corrupt_pointers: Vec::new(),
            fragment_cycles: Vec::new(),
        }
    }

    /// A v5 file.
    pub fn v5(page_length: u16) -> Self {
        Self::with_version(FileVersion::V5, page_length)
    }

    /// A v6 file.
    pub fn v6(page_length: u16) -> Self {
        Self::with_version(FileVersion::V6, page_length)
    }

    /// Sets the logical record length.
    pub fn record_length(mut self, length: u16) -> Self {
        self.record_length = length;
        self
    }

    /// Overrides the physical record length.
    pub fn physical_record_length(mut self, length: u16) -> Self {
        self.physical_record_length = Some(length);
        self
    }

    /// Marks records as variable-length. Bytes past the record length
    /// become the tail.
    pub fn variable_length(mut self, variable: bool) -> Self {
        self.variable = variable;
        self
    }

    /// Sets the log-key flag.
    pub fn log_key(mut self, present: bool) -> Self {
        self.log_key = present;
        self
    }

    /// Adds a key.
    pub fn key(mut self, key: KeySpec) -> Self {
        self.keys.push(key);
        self
    }

    /// Adds a record.
    pub fn record(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.records.push(data.into());
        self
    }

    /// Adds several records.
    pub fn records<I, R>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Vec<u8>>,
    {
        self.records.extend(records.into_iter().map(Into::into));
        self
    }

    /// Adds an ACS page.
    pub fn acs(mut self, name: &str, table: [u8; 256]) -> Self {
        self.acs = Some((name.to_string(), table));
        self
    }

    /// Lists the ACS page twice in the PAT (v6).
    pub fn duplicate_acs(mut self) -> Self {
        self.duplicate_acs = true;
        self
    }

    /// Places a free-listed slot before record `index` (v5).
    pub fn deleted_slot(mut self, index: usize) -> Self {
        self.deleted_slots.push(index);
        self
    }

    /// Usage counters of the two v6 FCR pages.
    pub fn fcr_usage_counts(mut self, first: u32, second: u32) -> Self {
        self.fcr_usage = (first, second);
        self
    }

    /// Usage counters of every v6 PAT pair.
    pub fn pat_usage_counts(mut self, first: u32, second: u32) -> Self {
        self.pat_usage = (first, second);
        self
    }

    /// Overrides the record count written to the header.
    pub fn record_count(mut self, count: u32) -> Self {
        self.record_count = Some(count);
        self
    }

    /// Interleaves a vacant directory entry after every fragment.
    pub fn vacant_fragment_slots(mut self) -> Self {
        self.vacant_fragment_slots = true;
        self
    }

    /// Adds index pages.
    pub fn index_pages(mut self, count: usize) -> Self {
        self.index_pages = count;
        self
    }

    /// Caps the payload bytes of a single fragment.
    pub fn fragment_payload(mut self, bytes: usize) -> Self {
        self.fragment_payload = Some(bytes.max(1));
        self
    }

    /// Points record `index`'s tail at a page that does not exist.
    pub fn corrupt_pointer(mut self, index: usize) -> Self {
        self.corrupt_pointers.push(index);
        self
    }

    /// Makes record `index`'s tail chain loop between two fragments.
    pub fn fragment_cycle(mut self, index: usize) -> Self {
        self.fragment_cycles.push(index);
        self
    }

    /// Builds the file image.
    pub fn build(&self) -> Vec<u8> {
        self.build_file().bytes
    }

    /// Builds the file image and reports its layout.
    pub fn build_file(&self) -> BuiltFile {
        let mut layout = Layout::new(self.version, usize::from(self.page_length));
        let v6 = self.version == FileVersion::V6;

        if let Some((name, table)) = &self.acs {
            let copies = if self.duplicate_acs && v6 { 2 } else { 1 };
            for _ in 0..copies {
                let (_, physical) = layout.alloc(b'A');
                layout.pages[physical] = self.acs_page(name, table);
            }
        }

        let prefix = if v6 { 2 } else { 0 };
        let footer = if self.variable { 4 } else { 0 };
        let physical_len = usize::from(
            self.physical_record_length
                .unwrap_or(self.record_length + prefix + footer),
        );
        let per_page = (layout.page_length - DATA_PAGE_HEADER) / physical_len;
        assert!(per_page > 0, "physical record length exceeds the page");

        let mut slots = Vec::new();
        for index in 0..=self.records.len() {
            for _ in self.deleted_slots.iter().filter(|&&d| d == index) {
                slots.push(None);
            }
            if index < self.records.len() {
                slots.push(Some(index));
            }
        }

        let data_pages: Vec<usize> = (0..slots.len().div_ceil(per_page))
            .map(|_| {
                let (_, physical) = layout.alloc(b'D');
                layout.pages[physical][5] = 0x80;
                physical
            })
            .collect();

        let mut slot_offsets = Vec::with_capacity(slots.len());
        for (n, _) in slots.iter().enumerate() {
            let page = data_pages[n / per_page];
            slot_offsets.push(page * layout.page_length + DATA_PAGE_HEADER + (n % per_page) * physical_len);
        }

        let mut record_offsets = vec![0u32; self.records.len()];
        let mut free_offsets = Vec::new();
        let mut fragments = FragmentWriter::new(
            self.fragment_payload.unwrap_or(layout.page_length / 2),
            self.vacant_fragment_slots,
        );

        for (slot, &offset) in slots.iter().zip(&slot_offsets) {
            let Some(index) = *slot else {
                free_offsets.push(offset as u32);
                continue;
            };
            let record = &self.records[index];
            let fixed_len = usize::from(self.record_length);
            let mut bytes = vec![0u8; physical_len];
            if v6 {
                bytes[0] = 0x00;
                bytes[1] = 0x01;
            }
            let fixed = &record[..record.len().min(fixed_len)];
            bytes[prefix as usize..prefix as usize + fixed.len()].copy_from_slice(fixed);

            if self.variable {
                let tail = record.get(fixed_len..).unwrap_or(&[]);
                let pointer = if self.corrupt_pointers.contains(&index) {
                    [0x7F, 0xFF, 0xFF, 0x00]
                } else if self.fragment_cycles.contains(&index) {
                    fragments.write_cycle(&mut layout, tail)
                } else {
                    fragments.write_tail(&mut layout, tail)
                };
                let at = prefix as usize + fixed_len;
                bytes[at..at + 4].copy_from_slice(&pointer);
            }

            let page = offset / layout.page_length;
            let in_page = offset % layout.page_length;
            layout.pages[page][in_page..in_page + physical_len].copy_from_slice(&bytes);
            record_offsets[index] = (offset + usize::from(prefix)) as u32;
        }
        fragments.finish(&mut layout);

        for (i, &offset) in free_offsets.iter().enumerate() {
            let next = free_offsets.get(i + 1).copied().unwrap_or(u32::MAX);
            let page = offset as usize / layout.page_length;
            let in_page = offset as usize % layout.page_length;
            layout.pages[page][in_page..in_page + 4].copy_from_slice(&record_pointer(next));
        }

        for _ in 0..self.index_pages {
            layout.alloc(0x80 | b'I');
        }

        let free_head = free_offsets.first().copied().unwrap_or(u32::MAX);
        let (fcr_first, fcr_second) = self.fcr_pages(physical_len as u16, free_head);
        layout.pages[0] = fcr_first;
        if let Some(second) = fcr_second {
            layout.pages[1] = second;
        }
        layout.write_pats(self.pat_usage);

        BuiltFile {
            bytes: layout.pages.concat(),
            record_offsets,
            free_offsets,
        }
    }

    fn acs_page(&self, name: &str, table: &[u8; 256]) -> Vec<u8> {
        let mut page = vec![0u8; usize::from(self.page_length)];
        match self.version {
            FileVersion::V5 => page[..7].copy_from_slice(&[0, 0, 1, 0, 0, 0, 0xAC]),
            FileVersion::V6 => {
                page[1] = b'A';
                page[6] = 0xAC;
            }
        }
        let name = name.as_bytes();
        let len = name.len().min(9);
        page[7..7 + len].copy_from_slice(&name[..len]);
        page[0x0F..0x0F + 256].copy_from_slice(table);
        page
    }

    fn fcr_pages(&self, physical_len: u16, free_head: u32) -> (Vec<u8>, Option<Vec<u8>>) {
        let record_count = self
            .record_count
            .unwrap_or(self.records.len() as u32);
        let mut fcr = vec![0u8; usize::from(self.page_length)];
        let put16 = |fcr: &mut [u8], at: usize, v: u16| fcr[at..at + 2].copy_from_slice(&v.to_le_bytes());

        put16(&mut fcr, 0x08, self.page_length);
        fcr[0x10..0x14].copy_from_slice(&record_pointer(free_head));
        put16(&mut fcr, 0x14, self.keys.len() as u16);
        put16(&mut fcr, 0x16, self.record_length);
        put16(&mut fcr, 0x18, physical_len);
        put16(&mut fcr, 0x1A, (record_count >> 16) as u16);
        put16(&mut fcr, 0x1C, record_count as u16);
        if self.variable {
            fcr[0x38] = 0xFF;
            put16(&mut fcr, 0x106, 0x01);
        }
        if self.log_key {
            fcr[0x10C] = 1;
        }

        match self.version {
            FileVersion::V5 => {
                fcr[7] = 5;
                let defs: Vec<u8> = self.keys.iter().flat_map(KeySpec::encode).collect();
                assert!(
                    V5_DEFINITIONS + defs.len() <= fcr.len(),
                    "key definitions do not fit in the FCR"
                );
                fcr[V5_DEFINITIONS..V5_DEFINITIONS + defs.len()].copy_from_slice(&defs);
                (fcr, None)
            }
            FileVersion::V6 => {
                fcr[..4].copy_from_slice(b"FC\0\0");
                fcr[0x76] = self.keys.len() as u8;
                put16(&mut fcr, 0x78, V6_KAT as u16);
                let mut cursor = V6_KAT + 2 * self.keys.len();
                for (i, key) in self.keys.iter().enumerate() {
                    let defs = key.encode();
                    assert!(
                        cursor + V6_DEFINITION_GAP + defs.len() <= fcr.len(),
                        "key definitions do not fit in the FCR"
                    );
                    fcr[cursor..cursor + V6_DEFINITION_GAP].fill(0xEE);
                    cursor += V6_DEFINITION_GAP;
                    put16(&mut fcr, V6_KAT + 2 * i, cursor as u16);
                    fcr[cursor..cursor + defs.len()].copy_from_slice(&defs);
                    cursor += defs.len();
                }

                let (first_usage, second_usage) = self.fcr_usage;
                let mut first = fcr.clone();
                let mut second = fcr;
                first[4..8].copy_from_slice(&first_usage.to_le_bytes());
                second[4..8].copy_from_slice(&second_usage.to_le_bytes());

                let stale = if second_usage > first_usage { &mut first } else { &mut second };
                stale[0x1A..0x1E].fill(0);
                (first, Some(second))
            }
        }
    }
}

fn packed_page(page: u32) -> [u8; 3] {
    [(page >> 16) as u8, page as u8, (page >> 8) as u8]
}

fn record_pointer(pointer: u32) -> [u8; 4] {
    let high = ((pointer >> 16) as u16).to_le_bytes();
    let low = (pointer as u16).to_le_bytes();
    [high[0], high[1], low[0], low[1]]
}

fn fragment_pointer(page: u32, fragment: u8) -> [u8; 4] {
    let p = packed_page(page);
    [p[0], p[1], p[2], fragment]
}

/// Physical page store with logical numbering and PAT bookkeeping.
#[derive(Debug)]
struct Layout {
    version: FileVersion,
    page_length: usize,
    pages: Vec<Vec<u8>>,
    /// PAT entries (physical page, type code), indexed by logical page.
    entries: Vec<(u32, u8)>,
    next_physical: usize,
}

impl Layout {
    fn new(version: FileVersion, page_length: usize) -> Self {
        let reserved = match version {
            FileVersion::V5 => 1,
            FileVersion::V6 => 4,
        };
        Self {
            version,
            page_length,
            pages: vec![vec![0u8; page_length]; reserved],
            entries: vec![(0, 0)],
            next_physical: reserved,
        }
    }

    fn group_stride(&self) -> usize {
        self.page_length / 4
    }

    fn per_group(&self) -> usize {
        self.page_length / 4 - 2
    }

    fn is_pat_page(&self, physical: usize) -> bool {
        self.version == FileVersion::V6 && physical >= 2 && (physical - 2) % self.group_stride() < 2
    }

    fn ensure(&mut self, physical: usize) {
        while self.pages.len() <= physical {
            self.pages.push(vec![0u8; self.page_length]);
        }
    }

    /// Allocates a page, returning its logical and physical numbers.
    fn alloc(&mut self, code: u8) -> (u32, usize) {
        while self.is_pat_page(self.next_physical) {
            self.next_physical += 1;
        }
        let physical = self.next_physical;
        self.next_physical += 1;
        self.ensure(physical);

        match self.version {
            FileVersion::V5 => (physical as u32, physical),
            FileVersion::V6 => {
                self.entries.push((physical as u32, code));
                ((self.entries.len() - 1) as u32, physical)
            }
        }
    }

    fn write_pats(&mut self, usage: (u32, u32)) {
        if self.version != FileVersion::V6 {
            return;
        }
        let per_group = self.per_group();
        let groups = self.entries.len().div_ceil(per_group).max(1);
        for group in 0..groups {
            let first = 2 + group * self.group_stride();
            self.ensure(first + 1);

            let mut active = vec![0u8; self.page_length];
            let mut inactive = vec![0u8; self.page_length];
            for page in [&mut active, &mut inactive] {
                page[0] = b'P';
                page[1] = b'P';
                page[3] = group as u8;
            }
            let start = group * per_group;
            let end = (start + per_group).min(self.entries.len());
            for (i, &(physical, code)) in self.entries[start..end].iter().enumerate() {
                let at = 8 + i * 4;
                let p = packed_page(physical);
                active[at..at + 4].copy_from_slice(&[p[0], code, p[1], p[2]]);
            }

            let (first_usage, second_usage) = usage;
            let (mut pat1, mut pat2) = if second_usage > first_usage {
                (inactive, active)
            } else {
                (active, inactive)
            };
            pat1[4..8].copy_from_slice(&first_usage.to_le_bytes());
            pat2[4..8].copy_from_slice(&second_usage.to_le_bytes());
            self.pages[first] = pat1;
            self.pages[first + 1] = pat2;
        }
    }
}

/// Packs tail fragments onto variable pages.
#[derive(Debug)]
struct FragmentWriter {
    payload: usize,
    vacant_slots: bool,
    current: Option<VariablePage>,
}

#[derive(Debug)]
struct VariablePage {
    logical: u32,
    physical: usize,
    entries: Vec<u16>,
    used: usize,
}

impl FragmentWriter {
    fn new(payload: usize, vacant_slots: bool) -> Self {
        Self {
            payload,
            vacant_slots,
            current: None,
        }
    }

    /// Writes `tail` as a fragment chain and returns the record footer.
    fn write_tail(&mut self, layout: &mut Layout, tail: &[u8]) -> [u8; 4] {
        if tail.is_empty() {
            return END_POINTER;
        }
        let chunks: Vec<&[u8]> = tail.chunks(self.payload).collect();
        let mut next: Option<[u8; 4]> = None;
        for chunk in chunks.iter().rev() {
            let mut bytes = Vec::with_capacity(chunk.len() + 4);
            if let Some(pointer) = next {
                bytes.extend_from_slice(&pointer);
            }
            bytes.extend_from_slice(chunk);
            let (page, fragment, _) = self.push(layout, &bytes, next.is_some());
            next = Some(fragment_pointer(page, fragment));
        }
        next.unwrap_or(END_POINTER)
    }

    /// Writes two fragments pointing at each other.
    fn write_cycle(&mut self, layout: &mut Layout, tail: &[u8]) -> [u8; 4] {
        let mut first = vec![0u8; 4];
        first.extend_from_slice(tail);
        let (page_a, fragment_a, at_a) = self.push(layout, &first, true);

        let mut second = fragment_pointer(page_a, fragment_a).to_vec();
        second.extend_from_slice(tail);
        let (page_b, fragment_b, _) = self.push(layout, &second, true);

        let (physical, offset) = at_a;
        layout.pages[physical][offset..offset + 4].copy_from_slice(&fragment_pointer(page_b, fragment_b));
        fragment_pointer(page_a, fragment_a)
    }

    fn fits(&self, page: &VariablePage, len: usize, page_length: usize) -> bool {
        let added = if self.vacant_slots { 2 } else { 1 };
        let entries = page.entries.len() + added;
        entries < MAX_FRAGMENTS_PER_PAGE && page.used + len <= page_length - 2 * (entries + 1)
    }

    /// Appends one fragment, returning (logical page, index, (physical, offset)).
    fn push(&mut self, layout: &mut Layout, bytes: &[u8], continues: bool) -> (u32, u8, (usize, usize)) {
        let needs_page = match &self.current {
            Some(page) => !self.fits(page, bytes.len(), layout.page_length),
            None => true,
        };
        if needs_page {
            self.finish(layout);
            let (logical, physical) = layout.alloc(b'V');
            self.current = Some(VariablePage {
                logical,
                physical,
                entries: Vec::new(),
                used: FRAGMENT_AREA,
            });
        }

        let vacant_slots = self.vacant_slots;
        let page = self.current.as_mut().expect("current variable page");
        let offset = page.used;
        layout.pages[page.physical][offset..offset + bytes.len()].copy_from_slice(bytes);
        let index = page.entries.len() as u8;
        let flag = if continues { 0x8000 } else { 0 };
        page.entries.push(offset as u16 | flag);
        if vacant_slots {
            page.entries.push(0xFFFF);
        }
        page.used += bytes.len();
        (page.logical, index, (page.physical, offset))
    }

    /// Writes the directory of the open page.
    fn finish(&mut self, layout: &mut Layout) {
        let Some(page) = self.current.take() else {
            return;
        };
        let data = &mut layout.pages[page.physical];
        let count = page.entries.len() as u16;
        data[0x0A..0x0C].copy_from_slice(&count.to_le_bytes());
        let terminal = page.used as u16;
        for (i, entry) in page.entries.iter().chain(std::iter::once(&terminal)).enumerate() {
            let at = layout.page_length - 2 * (i + 1);
            data[at..at + 2].copy_from_slice(&entry.to_le_bytes());
        }
    }
}
