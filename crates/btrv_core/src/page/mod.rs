//! Page addressing.
//!
//! v5 files address pages directly. v6 files route every logical page
//! through a chain of page allocation tables (PATs); see [`translate`] and
//! [`allocation`].

pub mod allocation;
pub mod translate;

use crate::bytes::slice;
use crate::error::{BtrieveError, BtrieveResult};
use crate::header::Header;
use crate::types::FormatVersion;

pub use allocation::{PageInventory, PageType, PatEntry};

/// Resolves logical page references against a file image.
#[derive(Debug, Clone, Copy)]
pub struct PageMap<'a> {
    data: &'a [u8],
    version: FormatVersion,
    page_length: usize,
}

impl<'a> PageMap<'a> {
    /// Creates a page map over `data` using the geometry in `header`.
    #[must_use]
    pub fn new(data: &'a [u8], header: &Header) -> Self {
        Self {
            data,
            version: header.version,
            page_length: usize::from(header.page_length),
        }
    }

    /// Page size in bytes.
    #[must_use]
    pub fn page_length(&self) -> usize {
        self.page_length
    }

    /// Physical byte offset of the variable-data page `logical`.
    ///
    /// # Errors
    ///
    /// Fails if the page lies outside the file or, for v6, if the PAT entry
    /// is missing or not a variable-data page.
    pub fn variable_page_offset(&self, logical: u32) -> BtrieveResult<usize> {
        let offset = match self.version {
            FormatVersion::V5 => (logical as usize)
                .checked_mul(self.page_length)
                .ok_or_else(|| overflow(logical))?,
            FormatVersion::V6 => translate::physical_offset(self.data, self.page_length, logical)?,
        };
        match offset.checked_add(self.page_length) {
            Some(end) if end <= self.data.len() => Ok(offset),
            _ => Err(overflow(logical)),
        }
    }

    /// The full variable-data page `logical`.
    ///
    /// # Errors
    ///
    /// See [`PageMap::variable_page_offset`].
    pub fn variable_page(&self, logical: u32) -> BtrieveResult<&'a [u8]> {
        let offset = self.variable_page_offset(logical)?;
        slice(self.data, offset, self.page_length)
    }
}

fn overflow(logical: u32) -> BtrieveError {
    BtrieveError::invalid_format(format!(
        "variable page reference {logical:#x} overflows the file"
    ))
}
