//! Key segment definitions.

use super::attributes::KeyAttributes;
use super::data_type::KeyDataType;
use crate::acs::AcsTable;
use std::sync::Arc;

/// One component of a key: where it lives in the record and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Number of the key this segment belongs to.
    pub number: u16,
    /// Position within the key, starting at 0.
    pub index: usize,
    /// Attribute flags.
    pub attributes: KeyAttributes,
    /// Data type.
    pub data_type: KeyDataType,
    /// Byte offset in the record.
    pub offset: u16,
    /// Byte length.
    pub length: u16,
    /// Null sentinel byte.
    pub null_value: u8,
    /// ACS number from the definition.
    pub acs_number: u32,
    /// Shared substitution table, if the segment uses one.
    pub acs: Option<Arc<AcsTable>>,
}

impl Segment {
    /// Creates a segment with no attributes.
    #[must_use]
    pub fn new(number: u16, data_type: KeyDataType, offset: u16, length: u16) -> Self {
        Self {
            number,
            index: 0,
            attributes: KeyAttributes::empty(),
            data_type,
            offset,
            length,
            null_value: 0,
            acs_number: 0,
            acs: None,
        }
    }

    /// Sets the attribute flags.
    #[must_use]
    pub fn with_attributes(mut self, attributes: KeyAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the null sentinel.
    #[must_use]
    pub fn with_null_value(mut self, null_value: u8) -> Self {
        self.null_value = null_value;
        self
    }

    /// Binds a substitution table and flags the segment as using it.
    #[must_use]
    pub fn with_acs(mut self, acs: Arc<AcsTable>) -> Self {
        self.attributes |= KeyAttributes::NUMBERED_ACS;
        self.acs = Some(acs);
        self
    }

    /// True if this segment is followed by another of the same key.
    #[must_use]
    pub fn is_segmented(&self) -> bool {
        self.attributes.contains(KeyAttributes::SEGMENTED)
    }

    /// True if the segment's bytes pass through an ACS.
    #[must_use]
    pub fn requires_acs(&self) -> bool {
        self.attributes.contains(KeyAttributes::NUMBERED_ACS)
    }

    /// True if duplicate values are allowed.
    #[must_use]
    pub fn allows_duplicates(&self) -> bool {
        self.attributes.contains(KeyAttributes::DUPLICATES)
    }

    /// True if the segment can nullify its key.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.attributes.contains(KeyAttributes::NULL_ALL_SEGMENTS)
    }

    /// Byte range of the segment within a record.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = usize::from(self.offset);
        start..start + usize::from(self.length)
    }
}
