//! Sequential record recovery from data pages.

use super::fragment::{FragmentPointer, FragmentReader, POINTER_LEN};
use super::Record;
use crate::bytes::{record_pointer, slice, u8_at};
use crate::config::LoadOptions;
use crate::error::{BtrieveError, BtrieveResult};
use crate::file::LoadWarning;
use crate::header::{Header, DATA_PAGE_HEADER_LEN};
use crate::page::PageMap;
use crate::types::FormatVersion;
use std::collections::HashSet;
use tracing::{debug, warn};

const PAGE_USAGE: usize = 5;

/// Scans every data page and returns the records found.
///
/// `free` holds slot offsets to skip. Per-record failures are fatal unless
/// `options` allows corrupted records, in which case they become warnings.
pub(crate) fn load_records(
    data: &[u8],
    header: &Header,
    free: &HashSet<u32>,
    options: &LoadOptions,
    warnings: &mut Vec<LoadWarning>,
) -> BtrieveResult<Vec<Record>> {
    let page_length = usize::from(header.page_length);
    let physical = usize::from(header.physical_record_length);
    let per_page = header.records_per_page();
    let reader = FragmentReader::new(PageMap::new(data, header), options.detect_fragment_cycles);

    let mut records = Vec::new();
    let mut consumed = 0u32;

    'pages: for page in 1..=header.page_count(data.len()) {
        let page_offset = page * page_length;
        if u8_at(data, page_offset + PAGE_USAGE)? & 0x80 == 0 {
            continue;
        }

        let body = page_offset + DATA_PAGE_HEADER_LEN;
        for slot in 0..per_page {
            if consumed == header.record_count {
                break 'pages;
            }

            let slot_offset = body + slot * physical;
            if free.contains(&file_offset(slot_offset)?) {
                continue;
            }
            let slot_bytes = slice(data, slot_offset, physical)?;
            if is_unused(slot_bytes, header.version, data.len()) {
                break;
            }

            let offset = file_offset(slot_offset + header.data_offset())?;
            match read_record(data, header, &reader, offset) {
                Ok(bytes) => records.push(Record::new(offset, bytes)),
                Err(source) => {
                    if !options.allow_corrupted_records {
                        return Err(BtrieveError::record_decode(offset, source));
                    }
                    warn!(offset, error = %source, "skipping corrupted record");
                    warnings.push(LoadWarning::CorruptedRecord {
                        offset,
                        reason: source.to_string(),
                    });
                }
            }
            consumed += 1;
        }
        debug!(page, records = records.len(), "scanned data page");
    }

    if records.len() != header.record_count as usize {
        warn!(
            expected = header.record_count,
            actual = records.len(),
            "record count does not match header"
        );
        warnings.push(LoadWarning::RecordCountMismatch {
            expected: header.record_count,
            actual: records.len(),
        });
    }

    Ok(records)
}

fn file_offset(offset: usize) -> BtrieveResult<u32> {
    u32::try_from(offset)
        .map_err(|_| BtrieveError::invalid_format(format!("offset {offset:#x} exceeds 32 bits")))
}

/// v6 slots open with a usage count that is zero when unused. v5 unused
/// slots hold a free-list pointer into the file followed by zeros.
fn is_unused(slot: &[u8], version: FormatVersion, file_len: usize) -> bool {
    match version {
        FormatVersion::V6 => slot.len() >= 2 && slot[0] == 0 && slot[1] == 0,
        FormatVersion::V5 => {
            slot.len() >= 8
                && slot[4..8].iter().all(|&b| b == 0)
                && (record_pointer(&slot[..4]) as usize) < file_len
        }
    }
}

fn read_record(
    data: &[u8],
    header: &Header,
    reader: &FragmentReader<'_>,
    offset: u32,
) -> BtrieveResult<Vec<u8>> {
    let start = offset as usize;
    let record_length = usize::from(header.record_length);
    let mut bytes = slice(data, start, record_length)?.to_vec();

    if header.variable_length {
        let slot_room = usize::from(header.physical_record_length).saturating_sub(header.data_offset());
        if record_length + POINTER_LEN > slot_room {
            return Err(BtrieveError::invalid_format(format!(
                "variable-length footer at {:#x} overflows its {}-byte slot",
                start + record_length,
                header.physical_record_length
            )));
        }
        let footer = slice(data, start + record_length, POINTER_LEN)?;
        reader.read_tail(FragmentPointer::parse(footer), &mut bytes)?;
    }

    Ok(bytes)
}
