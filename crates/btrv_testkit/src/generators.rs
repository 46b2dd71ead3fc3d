//! Property-based test generators using proptest.

use crate::builder::FileVersion;
use proptest::prelude::*;

/// Either format generation.
pub fn version_strategy() -> impl Strategy<Value = FileVersion> {
    prop_oneof![Just(FileVersion::V5), Just(FileVersion::V6)]
}

/// Valid page lengths.
pub fn page_length_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![Just(512u16), Just(1024), Just(2048), Just(4096)]
}

/// A fixed record of `len` (at least 8) bytes that a v5 scan cannot mistake
/// for an empty slot.
pub fn fixed_record_strategy(len: usize) -> impl Strategy<Value = Vec<u8>> {
    assert!(len >= 8, "records must cover the v5 free-slot marker");
    prop::collection::vec(any::<u8>(), len).prop_map(|mut record| {
        record[4] |= 0x01;
        record
    })
}

/// A variable-length tail.
pub fn tail_strategy(max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn fixed_records_are_marked_used(record in fixed_record_strategy(12)) {
            prop_assert_eq!(record.len(), 12);
            prop_assert_ne!(record[4], 0);
        }

        #[test]
        fn page_lengths_are_valid(pl in page_length_strategy()) {
            prop_assert_eq!(pl % 512, 0);
        }
    }
}
