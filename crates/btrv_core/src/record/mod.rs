//! Records and their recovery from data pages.

pub(crate) mod fragment;
pub(crate) mod free_list;
pub(crate) mod loader;

/// A record recovered from a data page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    offset: u32,
    data: Vec<u8>,
}

impl Record {
    /// Creates a record identified by its absolute file offset.
    #[must_use]
    pub fn new(offset: u32, data: Vec<u8>) -> Self {
        Self { offset, data }
    }

    /// Absolute file offset of the record data.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Record bytes: the fixed part followed by any variable-length tail.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the record holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the record, returning its bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
