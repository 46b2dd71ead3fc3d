//! Page allocation tables (v6).

use super::translate::FIRST_PAT_PAGE;
use crate::bytes::{packed_page, slice, u32_le};
use crate::error::{BtrieveError, BtrieveResult};
use tracing::debug;

/// Size of the PAT page header preceding the entries.
pub const PAT_HEADER_LEN: usize = 8;
/// Size of one PAT entry.
pub const PAT_ENTRY_LEN: usize = 4;

const PAT_MARKER: [u8; 2] = [b'P', b'P'];

/// Classification of a page by its PAT type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    /// Entry not in use.
    Unallocated,
    /// Alternate collating sequence page (`'A'`).
    Acs,
    /// Fixed-length record page (`'D'`).
    FixedData,
    /// Extra page (`'E'`).
    Extra,
    /// Variable-length record page (`'V'`).
    VariableData,
    /// Index page (high bit set); carries the remaining low bits.
    Index(u8),
}

impl PageType {
    /// Classifies a PAT type code.
    ///
    /// # Errors
    ///
    /// Fails on a nonzero code that is neither an index page nor one of
    /// `A`, `D`, `E` or `V`.
    pub fn from_code(code: u8) -> BtrieveResult<Self> {
        if code & 0x80 != 0 {
            return Ok(Self::Index(code & 0x7F));
        }
        match code {
            0 => Ok(Self::Unallocated),
            b'A' => Ok(Self::Acs),
            b'D' => Ok(Self::FixedData),
            b'E' => Ok(Self::Extra),
            b'V' => Ok(Self::VariableData),
            other => Err(BtrieveError::invalid_format(format!(
                "bad PAT entry type code {other:#04x}"
            ))),
        }
    }
}

/// One 4-byte PAT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    /// Physical page number.
    pub page: u32,
    /// Raw type code.
    pub type_code: u8,
}

impl PatEntry {
    /// Decodes an entry: page number packed high, low, mid around the type
    /// code in byte 1.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            page: packed_page(&[bytes[0], bytes[2], bytes[3]]),
            type_code: bytes[1],
        }
    }
}

/// Per-type page counts and the ACS pages found by [`enumerate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInventory {
    /// Physical page numbers of ACS pages, in table order.
    pub acs_pages: Vec<u32>,
    /// Fixed-length data pages.
    pub fixed_data: usize,
    /// Variable-length data pages.
    pub variable_data: usize,
    /// Extra pages.
    pub extra: usize,
    /// Index pages.
    pub index: usize,
    /// Sequence number of the active PAT.
    pub sequence: u16,
}

fn has_marker(page: &[u8]) -> bool {
    page.starts_with(&PAT_MARKER)
}

/// Byte offset of the active page of the PAT pair starting at physical
/// page `first`.
///
/// The page with the larger usage counter wins and a tie goes to the first
/// page. A page lacking the `PP` marker is never chosen.
///
/// # Errors
///
/// Fails if neither page carries the marker or a page is out of range.
pub fn active_pat(data: &[u8], page_length: usize, first: usize) -> BtrieveResult<usize> {
    let first_offset = first
        .checked_mul(page_length)
        .ok_or_else(|| BtrieveError::invalid_format("PAT page out of range"))?;
    let second_offset = first_offset + page_length;
    let pat1 = slice(data, first_offset, page_length)?;
    let pat2 = slice(data, second_offset, page_length)?;

    match (has_marker(pat1), has_marker(pat2)) {
        (true, true) => {
            if u32_le(pat2, 4)? > u32_le(pat1, 4)? {
                Ok(second_offset)
            } else {
                Ok(first_offset)
            }
        }
        (true, false) => Ok(first_offset),
        (false, true) => Ok(second_offset),
        (false, false) => Err(BtrieveError::invalid_format(format!(
            "no valid PAT at page {first}"
        ))),
    }
}

/// Walks the first PAT pair and classifies every entry.
///
/// # Errors
///
/// Fails if either page of the first pair lacks its marker or an entry has
/// an unrecognized type code.
pub fn enumerate(data: &[u8], page_length: usize) -> BtrieveResult<PageInventory> {
    for page in [FIRST_PAT_PAGE, FIRST_PAT_PAGE + 1] {
        if !has_marker(slice(data, page * page_length, page_length)?) {
            return Err(BtrieveError::invalid_format(format!(
                "PAT page {page} is invalid"
            )));
        }
    }

    let offset = active_pat(data, page_length, FIRST_PAT_PAGE)?;
    let pat = slice(data, offset, page_length)?;
    let mut inventory = PageInventory {
        sequence: u16::from_be_bytes([pat[2], pat[3]]),
        ..PageInventory::default()
    };

    for raw in pat[PAT_HEADER_LEN..].chunks_exact(PAT_ENTRY_LEN) {
        let entry = PatEntry::parse(raw);
        match PageType::from_code(entry.type_code)? {
            PageType::Unallocated => {}
            PageType::Acs => inventory.acs_pages.push(entry.page),
            PageType::FixedData => inventory.fixed_data += 1,
            PageType::Extra => inventory.extra += 1,
            PageType::VariableData => inventory.variable_data += 1,
            PageType::Index(_) => inventory.index += 1,
        }
    }

    debug!(
        sequence = inventory.sequence,
        acs = inventory.acs_pages.len(),
        fixed = inventory.fixed_data,
        variable = inventory.variable_data,
        extra = inventory.extra,
        index = inventory.index,
        "enumerated page allocation table"
    );

    Ok(inventory)
}
