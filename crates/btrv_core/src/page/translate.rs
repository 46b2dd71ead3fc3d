//! Logical to physical page translation for v6 files.
//!
//! Pages are grouped `page_length / 4 - 2` to a PAT pair. Group `g` keeps
//! its ping-pong PAT pages at physical pages `2 + g * page_length / 4` and
//! the page after it.

use super::allocation::{active_pat, PatEntry, PAT_ENTRY_LEN, PAT_HEADER_LEN};
use crate::bytes::slice;
use crate::error::{BtrieveError, BtrieveResult};

/// Physical page number of the first PAT page.
pub const FIRST_PAT_PAGE: usize = 2;

/// Number of logical pages described by one PAT pair.
#[must_use]
pub fn pages_per_pat(page_length: usize) -> usize {
    page_length / 4 - 2
}

/// Physical page number of the first PAT page of group `group`.
#[must_use]
pub fn pat_page(page_length: usize, group: usize) -> Option<usize> {
    group
        .checked_mul(page_length / 4)
        .and_then(|p| p.checked_add(FIRST_PAT_PAGE))
}

/// Resolves the logical variable-data page `logical` to a physical byte offset.
///
/// # Errors
///
/// Fails if the group's PAT pair is missing or unreadable, or if the entry
/// does not describe a variable-data page.
pub fn physical_offset(data: &[u8], page_length: usize, logical: u32) -> BtrieveResult<usize> {
    let per_group = pages_per_pat(page_length);
    let logical = logical as usize;
    let group = logical / per_group;
    let index = logical % per_group;

    let first = pat_page(page_length, group).ok_or_else(|| {
        BtrieveError::invalid_format(format!("page {logical:#x} is beyond any PAT group"))
    })?;
    let pat = active_pat(data, page_length, first)?;
    let entry = PatEntry::parse(slice(
        data,
        pat + PAT_HEADER_LEN + index * PAT_ENTRY_LEN,
        PAT_ENTRY_LEN,
    )?);

    if entry.type_code != b'V' {
        return Err(BtrieveError::invalid_format(format!(
            "page {logical:#x} maps to a {:?} page, not variable data",
            char::from(entry.type_code)
        )));
    }

    (entry.page as usize)
        .checked_mul(page_length)
        .ok_or_else(|| BtrieveError::invalid_format("variable page reference overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PL: usize = 512;

    fn pat_page_bytes(usage: u32, entries: &[(usize, u32, u8)]) -> Vec<u8> {
        let mut page = vec![0u8; PL];
        page[0] = b'P';
        page[1] = b'P';
        page[4..8].copy_from_slice(&usage.to_le_bytes());
        for &(index, physical, code) in entries {
            let at = PAT_HEADER_LEN + index * PAT_ENTRY_LEN;
            page[at] = (physical >> 16) as u8;
            page[at + 1] = code;
            page[at + 2] = physical as u8;
            page[at + 3] = (physical >> 8) as u8;
        }
        page
    }

    fn image(pages: usize) -> Vec<u8> {
        vec![0u8; pages * PL]
    }

    fn put(data: &mut [u8], page: usize, bytes: &[u8]) {
        data[page * PL..(page + 1) * PL].copy_from_slice(bytes);
    }

    #[test]
    fn group_geometry() {
        assert_eq!(pages_per_pat(512), 126);
        assert_eq!(pages_per_pat(4096), 1022);
        assert_eq!(pat_page(512, 0), Some(2));
        assert_eq!(pat_page(512, 1), Some(130));
        assert_eq!(pat_page(1024, 2), Some(514));
    }

    #[test]
    fn translates_in_first_group() {
        let mut data = image(8);
        put(&mut data, 2, &pat_page_bytes(1, &[(5, 7, b'V')]));
        put(&mut data, 3, &pat_page_bytes(0, &[(5, 6, b'V')]));
        assert_eq!(physical_offset(&data, PL, 5).unwrap(), 7 * PL);
    }

    #[test]
    fn uses_active_pat_of_pair() {
        let mut data = image(8);
        put(&mut data, 2, &pat_page_bytes(1, &[(5, 7, b'V')]));
        put(&mut data, 3, &pat_page_bytes(2, &[(5, 6, b'V')]));
        assert_eq!(physical_offset(&data, PL, 5).unwrap(), 6 * PL);
    }

    #[test]
    fn walks_to_later_group() {
        let mut data = image(140);
        put(&mut data, 2, &pat_page_bytes(1, &[]));
        put(&mut data, 3, &pat_page_bytes(0, &[]));
        put(&mut data, 130, &pat_page_bytes(1, &[(0, 135, b'V'), (4, 139, b'V')]));
        put(&mut data, 131, &pat_page_bytes(0, &[]));
        assert_eq!(physical_offset(&data, PL, 126).unwrap(), 135 * PL);
        assert_eq!(physical_offset(&data, PL, 130).unwrap(), 139 * PL);
    }

    #[test]
    fn rejects_wrong_type_code() {
        let mut data = image(8);
        put(&mut data, 2, &pat_page_bytes(1, &[(5, 7, b'D')]));
        put(&mut data, 3, &pat_page_bytes(0, &[]));
        assert!(physical_offset(&data, PL, 5).is_err());
    }

    #[test]
    fn missing_group_is_an_error() {
        let mut data = image(8);
        put(&mut data, 2, &pat_page_bytes(1, &[]));
        put(&mut data, 3, &pat_page_bytes(0, &[]));
        assert!(physical_offset(&data, PL, 300).is_err());
    }
}
