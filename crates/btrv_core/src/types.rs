//! Core type definitions.

use std::fmt;

/// On-disk format generation of a Btrieve file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Btrieve 5.x: direct page addressing and a free-record chain.
    V5,
    /// Btrieve 6.x: redundant FCR pages and page allocation tables.
    V6,
}

impl FormatVersion {
    /// Bytes preceding the record data in each fixed-length slot.
    #[must_use]
    pub const fn slot_prefix(self) -> usize {
        match self {
            Self::V5 => 0,
            Self::V6 => 2,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V5 => write!(f, "v5"),
            Self::V6 => write!(f, "v6"),
        }
    }
}
