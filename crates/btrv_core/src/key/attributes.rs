//! Key attribute flags.

use bitflags::bitflags;

bitflags! {
    /// Attribute bits of a key segment definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyAttributes: u16 {
        /// Duplicate values are allowed.
        const DUPLICATES = 0x0001;
        /// The key may be modified.
        const MODIFIABLE = 0x0002;
        /// Legacy binary type when no extended type is given.
        const OLD_STYLE_BINARY = 0x0004;
        /// The key is null when every segment holds its null value.
        const NULL_ALL_SEGMENTS = 0x0008;
        /// Another segment of the same key follows.
        const SEGMENTED = 0x0010;
        /// Bytes pass through the file's alternate collating sequence.
        const NUMBERED_ACS = 0x0020;
        /// Sorted in descending order.
        const DESCENDING = 0x0040;
        /// Duplicates are stored as repeating entries.
        const REPEATING_DUPLICATES = 0x0080;
        /// The definition carries an explicit data type.
        const EXTENDED_DATA_TYPE = 0x0100;
        /// The key is null when any segment holds its null value.
        const NULL_ANY_SEGMENT = 0x0200;
        /// String comparisons ignore case.
        const CASE_INSENSITIVE = 0x0400;
        /// The ACS is looked up by name rather than number.
        const NAMED_ACS = 0x0420;
    }
}

impl KeyAttributes {
    /// Decodes the on-disk attribute word, keeping unknown bits.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self::from_bits_retain(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retains_unknown_bits() {
        let attrs = KeyAttributes::from_raw(0x8101);
        assert!(attrs.contains(KeyAttributes::DUPLICATES | KeyAttributes::EXTENDED_DATA_TYPE));
        assert_eq!(attrs.bits(), 0x8101);
    }
}
