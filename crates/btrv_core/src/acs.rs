//! Alternate collating sequences.

use crate::bytes::slice;
use crate::error::{BtrieveError, BtrieveResult};

/// Signature opening a v5 ACS page.
const V5_ACS_SIGNATURE: [u8; 7] = [0, 0, 1, 0, 0, 0, 0xAC];

const NAME_OFFSET: usize = 7;
const NAME_LEN: usize = 9;
const TABLE_OFFSET: usize = 0x0F;

/// Number of entries in a substitution table.
pub const ACS_TABLE_LEN: usize = 256;

/// A named 256-byte substitution table applied to key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct AcsTable {
    name: String,
    table: [u8; ACS_TABLE_LEN],
}

impl std::fmt::Debug for AcsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcsTable").field("name", &self.name).finish_non_exhaustive()
    }
}

impl AcsTable {
    /// Creates a table from its name and substitution bytes.
    #[must_use]
    pub fn new(name: impl Into<String>, table: [u8; ACS_TABLE_LEN]) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    /// Table name with trailing NULs and spaces removed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw substitution bytes.
    #[must_use]
    pub fn table(&self) -> &[u8; ACS_TABLE_LEN] {
        &self.table
    }

    /// Rewrites every byte of `bytes` through the table.
    pub fn apply(&self, bytes: &mut [u8]) {
        for b in bytes {
            *b = self.table[usize::from(*b)];
        }
    }

    /// Loads the v5 ACS page, which immediately follows the FCR.
    ///
    /// A missing page or signature simply means the file has no ACS.
    #[must_use]
    pub fn load_v5(data: &[u8], page_length: usize) -> Option<Self> {
        let page = slice(data, page_length, page_length).ok()?;
        if !page.starts_with(&V5_ACS_SIGNATURE) {
            return None;
        }
        Some(Self::from_body(page))
    }

    /// Loads the ACS stored on physical page `page` of a v6 file.
    ///
    /// # Errors
    ///
    /// Fails if the page is out of range or lacks the v6 ACS header.
    pub fn from_v6_page(data: &[u8], page_length: usize, page: u32) -> BtrieveResult<Self> {
        let offset = (page as usize)
            .checked_mul(page_length)
            .ok_or_else(|| BtrieveError::invalid_format("ACS page out of range"))?;
        let page_bytes = slice(data, offset, page_length)?;
        if page_bytes[1] != b'A' || page_bytes[6] != 0xAC {
            return Err(BtrieveError::invalid_format(format!(
                "bad v6 ACS header on page {page}"
            )));
        }
        Ok(Self::from_body(page_bytes))
    }

    fn from_body(page: &[u8]) -> Self {
        let raw_name = &page[NAME_OFFSET..NAME_OFFSET + NAME_LEN];
        let name = String::from_utf8_lossy(raw_name)
            .trim_end_matches(['\0', ' '])
            .to_string();
        let mut table = [0u8; ACS_TABLE_LEN];
        table.copy_from_slice(&page[TABLE_OFFSET..TABLE_OFFSET + ACS_TABLE_LEN]);
        Self { name, table }
    }
}

/// Table mapping ASCII lowercase letters to uppercase.
#[cfg(test)]
pub(crate) fn upper_case_table() -> [u8; ACS_TABLE_LEN] {
    let mut table = [0u8; ACS_TABLE_LEN];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = (i as u8).to_ascii_uppercase();
    }
    table
}
