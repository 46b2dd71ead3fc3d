//! Keys and their segments.
//!
//! A [`Key`] is an ordered list of [`Segment`]s. Single-segment keys decode
//! to typed values; composite keys decode to the concatenated segment bytes.
//! See [`codec`] for the exact rules.

mod attributes;
pub mod codec;
mod data_type;
pub(crate) mod definition;
mod segment;

pub use attributes::KeyAttributes;
pub use codec::{sign_extend, zero_extend, KeyValue};
pub use data_type::KeyDataType;
pub use segment::Segment;

use crate::error::{BtrieveError, BtrieveResult};
use std::cmp::Ordering;

/// A logical key made of one or more segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    number: u16,
    segments: Vec<Segment>,
}

impl Key {
    /// Creates a key, renumbering `segments` in the given order.
    #[must_use]
    pub fn new(number: u16, segments: Vec<Segment>) -> Self {
        let mut key = Self {
            number,
            segments: Vec::with_capacity(segments.len()),
        };
        for segment in segments {
            key.push_segment(segment);
        }
        key
    }

    pub(crate) fn push_segment(&mut self, mut segment: Segment) {
        segment.number = self.number;
        segment.index = self.segments.len();
        self.segments.push(segment);
    }

    /// Key number.
    #[must_use]
    pub fn number(&self) -> u16 {
        self.number
    }

    /// Segments in index order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The first segment.
    #[must_use]
    pub fn primary_segment(&self) -> Option<&Segment> {
        self.segments.first()
    }

    /// True if the key has more than one segment.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.segments.len() > 1
    }

    /// Total length of all segments.
    #[must_use]
    pub fn length(&self) -> usize {
        self.segments.iter().map(|s| usize::from(s.length)).sum()
    }

    /// Extracts this key's value from `record`.
    ///
    /// # Errors
    ///
    /// Returns [`BtrieveError::SegmentOutOfBounds`] if a segment does not fit
    /// in `record`.
    pub fn extract(&self, record: &[u8]) -> BtrieveResult<KeyValue> {
        let windows = self
            .segments
            .iter()
            .map(|segment| {
                record
                    .get(segment.range())
                    .ok_or(BtrieveError::SegmentOutOfBounds {
                        key: self.number,
                        segment: segment.index,
                        offset: segment.offset,
                        length: segment.length,
                        record_len: record.len(),
                    })
            })
            .collect::<BtrieveResult<Vec<_>>>()?;

        Ok(codec::decode(&self.segments, &windows))
    }

    /// Orders two records by this key.
    ///
    /// # Errors
    ///
    /// Fails if the key cannot be extracted from either record.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> BtrieveResult<Ordering> {
        Ok(self.extract(a)?.cmp(&self.extract(b)?))
    }
}
