//! Variable-length tail reconstruction.
//!
//! A variable page holds a fragment count at offset 0x0A and a directory of
//! 2-byte entries growing backward from the page end. Entry `f` sits at
//! `page_length - 2 * (f + 1)`: a 15-bit offset plus a high "continues" bit,
//! or 0xFFFF for a vacant slot. A fragment runs up to the next occupied
//! entry's offset. A continuing fragment opens with a 4-byte pointer to the
//! next fragment.

use crate::bytes::{packed_page, slice, u16_le};
use crate::error::{BtrieveError, BtrieveResult};
use crate::page::PageMap;
use std::collections::HashSet;

const FRAGMENT_COUNT: usize = 0x0A;
const MIN_FRAGMENT_OFFSET: usize = 0x0C;
const VACANT: u16 = 0xFFFF;
const CONTINUES: u16 = 0x8000;

/// Size of a continuation pointer.
pub const POINTER_LEN: usize = 4;

/// Reference to a fragment: a logical page and a directory index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentPointer {
    /// Logical page, 24 bits.
    pub page: u32,
    /// Directory index on that page.
    pub fragment: u8,
}

impl FragmentPointer {
    /// Decodes a pointer: page packed high, low, mid, then the fragment.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            page: packed_page(bytes),
            fragment: bytes[3],
        }
    }

    /// True for the "no continuation" sentinel.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.page == 0x00FF_FFFF && self.fragment == 0xFF
    }
}

/// One fragment located on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// Fragment bytes, including any leading continuation pointer.
    pub bytes: &'a [u8],
    /// The fragment opens with a pointer to the next one.
    pub continues: bool,
}

fn directory_entry(page: &[u8], index: usize) -> BtrieveResult<u16> {
    let at = page
        .len()
        .checked_sub(2 * (index + 1))
        .ok_or_else(|| BtrieveError::invalid_format(format!("fragment {index} outside directory")))?;
    u16_le(page, at)
}

/// Finds fragment `index` on `page`.
///
/// # Errors
///
/// Fails if the entry is vacant, the offset is below the page header, no
/// later occupied entry bounds the fragment, or the fragment overlaps the
/// directory.
pub fn locate_fragment(page: &[u8], index: u8) -> BtrieveResult<Fragment<'_>> {
    let index = usize::from(index);
    let count = usize::from(u16_le(page, FRAGMENT_COUNT)?);

    let entry = directory_entry(page, index)?;
    if entry == VACANT {
        return Err(BtrieveError::invalid_format(format!("fragment {index} is vacant")));
    }
    let offset = usize::from(entry & !CONTINUES);
    let continues = entry & CONTINUES != 0;
    if offset < MIN_FRAGMENT_OFFSET {
        return Err(BtrieveError::invalid_format(format!(
            "fragment {index} offset {offset:#x} overlaps the page header"
        )));
    }

    let mut next = None;
    for i in index + 1..=count {
        let candidate = directory_entry(page, i)?;
        if candidate != VACANT {
            next = Some(usize::from(candidate & !CONTINUES));
            break;
        }
    }
    let next = next.ok_or_else(|| {
        BtrieveError::invalid_format(format!(
            "no fragment follows {index} of {count} to bound its length"
        ))
    })?;

    let length = next.checked_sub(offset).ok_or_else(|| {
        BtrieveError::invalid_format(format!("fragment {index} ends before it starts"))
    })?;
    let directory_start = page.len().checked_sub(2 * (count + 1));
    if directory_start.map_or(true, |limit| offset + length > limit) {
        return Err(BtrieveError::invalid_format(format!(
            "fragment {index} of {count} overflows into the directory"
        )));
    }

    Ok(Fragment {
        bytes: slice(page, offset, length)?,
        continues,
    })
}

/// Follows continuation pointers across variable pages.
pub(crate) struct FragmentReader<'a> {
    pages: PageMap<'a>,
    detect_cycles: bool,
}

impl<'a> FragmentReader<'a> {
    pub(crate) fn new(pages: PageMap<'a>, detect_cycles: bool) -> Self {
        Self {
            pages,
            detect_cycles,
        }
    }

    /// Appends the tail starting at `pointer` to `out`.
    pub(crate) fn read_tail(&self, mut pointer: FragmentPointer, out: &mut Vec<u8>) -> BtrieveResult<()> {
        let mut visited = HashSet::new();
        loop {
            if pointer.is_end() {
                return Ok(());
            }
            if self.detect_cycles && !visited.insert(pointer) {
                return Err(BtrieveError::invalid_format(format!(
                    "fragment chain revisits page {:#x} fragment {}",
                    pointer.page, pointer.fragment
                )));
            }

            let page = self.pages.variable_page(pointer.page)?;
            let fragment = locate_fragment(page, pointer.fragment)?;
            if !fragment.continues {
                out.extend_from_slice(fragment.bytes);
                return Ok(());
            }
            if fragment.bytes.len() < POINTER_LEN {
                return Err(BtrieveError::invalid_format(format!(
                    "fragment {} on page {:#x} is too short for its continuation",
                    pointer.fragment, pointer.page
                )));
            }
            let (next, rest) = fragment.bytes.split_at(POINTER_LEN);
            out.extend_from_slice(rest);
            pointer = FragmentPointer::parse(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PL: usize = 512;

    fn make_page(count: u16, entries: &[u16]) -> Vec<u8> {
        let mut page = vec![0u8; PL];
        page[FRAGMENT_COUNT..FRAGMENT_COUNT + 2].copy_from_slice(&count.to_le_bytes());
        for (i, entry) in entries.iter().enumerate() {
            let at = PL - 2 * (i + 1);
            page[at..at + 2].copy_from_slice(&entry.to_le_bytes());
        }
        for (i, b) in page[MIN_FRAGMENT_OFFSET..PL - 64].iter_mut().enumerate() {
            *b = i as u8;
        }
        page
    }

    #[test]
    fn pointer_sentinel() {
        let end = FragmentPointer::parse(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(end.is_end());
        let p = FragmentPointer::parse(&[0x00, 0x05, 0x01, 0x02]);
        assert_eq!(p, FragmentPointer { page: 0x0105, fragment: 2 });
        assert!(!p.is_end());
    }

    #[test]
    fn length_comes_from_next_entry() {
        let page = make_page(2, &[0x0C, 0x8010, 0x20]);
        let first = locate_fragment(&page, 0).unwrap();
        assert_eq!(first.bytes.len(), 4);
        assert!(!first.continues);
        let second = locate_fragment(&page, 1).unwrap();
        assert_eq!(second.bytes.len(), 0x10);
        assert!(second.continues);
        assert_eq!(second.bytes[0], 4);
    }

    #[test]
    fn skips_vacant_entries() {
        let page = make_page(3, &[0x0C, 0xFFFF, 0xFFFF, 0x30]);
        assert_eq!(locate_fragment(&page, 0).unwrap().bytes.len(), 0x24);
        assert!(locate_fragment(&page, 1).is_err());
    }

    #[test]
    fn rejects_low_offset() {
        let page = make_page(1, &[0x08, 0x20]);
        assert!(locate_fragment(&page, 0).is_err());
    }

    #[test]
    fn rejects_missing_terminator() {
        let page = make_page(1, &[0x0C, 0xFFFF]);
        assert!(locate_fragment(&page, 0).is_err());
    }

    #[test]
    fn rejects_directory_overlap() {
        let page = make_page(2, &[0x0C, 0x1F0, 0x1FE]);
        assert!(locate_fragment(&page, 1).is_err());
        let page = make_page(2, &[0x40, 0x20, 0x30]);
        assert!(locate_fragment(&page, 0).is_err());
    }
}
