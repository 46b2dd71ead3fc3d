//! Key definition loading.
//!
//! Definitions are 30-byte records in the FCR page, one per segment. v5
//! packs them from FCR offset 0x110. v6 lists one offset per key in the key
//! allocation table; the segments of a composite key follow each other from
//! that offset.

use super::{Key, KeyAttributes, KeyDataType, Segment};
use crate::acs::AcsTable;
use crate::bytes::{packed_page, slice, u16_le};
use crate::error::{BtrieveError, BtrieveResult};
use crate::header::Header;
use crate::types::FormatVersion;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Size of one key definition.
pub const KEY_DEFINITION_LEN: usize = 0x1E;

const V5_DEFINITIONS: usize = 0x110;

const ATTRIBUTES: usize = 0x08;
const OFFSET: usize = 0x14;
const LENGTH: usize = 0x16;
const ACS_NUMBER: usize = 0x19;
const EXTENDED_TYPE: usize = 0x1C;
const NULL_VALUE: usize = 0x1D;

/// Reads every key definition from the active FCR.
pub(crate) fn load_keys(
    data: &[u8],
    header: &Header,
    acs: Option<&Arc<AcsTable>>,
) -> BtrieveResult<BTreeMap<u16, Key>> {
    let fcr = slice(data, header.fcr_offset(), usize::from(header.page_length))?;
    let key_count = header.key_count;
    let v6 = header.version == FormatVersion::V6;

    let starts = if v6 {
        if u16::from(header.kat_count) != key_count {
            return Err(BtrieveError::invalid_format(format!(
                "key allocation table lists {} keys, header says {key_count}",
                header.kat_count
            )));
        }
        let kat = usize::from(header.kat_offset);
        (0..usize::from(key_count))
            .map(|i| u16_le(fcr, kat + 2 * i).map(usize::from))
            .collect::<BtrieveResult<Vec<_>>>()?
    } else {
        (0..usize::from(key_count))
            .map(|i| V5_DEFINITIONS + i * KEY_DEFINITION_LEN)
            .collect()
    };

    let mut keys: BTreeMap<u16, Key> = BTreeMap::new();
    let Some(&first) = starts.first() else {
        return Ok(keys);
    };

    let mut number = 0u16;
    let mut cursor = first;
    while number < key_count {
        let raw = cursor
            .checked_add(KEY_DEFINITION_LEN)
            .and_then(|end| fcr.get(cursor..end))
            .ok_or_else(|| {
                BtrieveError::invalid_format(format!(
                    "key {number} definition at {cursor:#x} runs past the FCR page"
                ))
            })?;
        let segment = parse_definition(number, raw, acs)?;
        debug!(
            key = number,
            data_type = %segment.data_type,
            attributes = ?segment.attributes,
            offset = segment.offset,
            length = segment.length,
            "loaded key definition"
        );

        let segmented = segment.is_segmented();
        keys.entry(number)
            .or_insert_with(|| Key::new(number, Vec::new()))
            .push_segment(segment);

        if segmented {
            cursor += KEY_DEFINITION_LEN;
        } else {
            number += 1;
            cursor = match starts.get(usize::from(number)) {
                Some(&next) if v6 => next,
                _ => cursor + KEY_DEFINITION_LEN,
            };
        }
    }

    Ok(keys)
}

fn parse_definition(
    number: u16,
    raw: &[u8],
    acs: Option<&Arc<AcsTable>>,
) -> BtrieveResult<Segment> {
    let attributes = KeyAttributes::from_raw(u16_le(raw, ATTRIBUTES)?);
    let data_type = if attributes.contains(KeyAttributes::EXTENDED_DATA_TYPE) {
        KeyDataType::from_code(raw[EXTENDED_TYPE])
    } else if attributes.contains(KeyAttributes::OLD_STYLE_BINARY) {
        KeyDataType::OldBinary
    } else {
        KeyDataType::OldAscii
    };

    let mut segment = Segment::new(number, data_type, u16_le(raw, OFFSET)?, u16_le(raw, LENGTH)?)
        .with_attributes(attributes)
        .with_null_value(raw[NULL_VALUE]);
    segment.acs_number = packed_page(slice(raw, ACS_NUMBER, 3)?);

    if segment.requires_acs() {
        let acs = acs.ok_or_else(|| {
            BtrieveError::invalid_format(format!(
                "key {number} requires an ACS but the file has none"
            ))
        })?;
        segment = segment.with_acs(Arc::clone(acs));
    }

    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use btrv_testkit::{codes, FileBuilder, KeySpec, SegmentSpec};

    fn keys_of(data: &[u8], acs: Option<&Arc<AcsTable>>) -> BtrieveResult<BTreeMap<u16, Key>> {
        let header = Header::parse(data)?;
        load_keys(data, &header, acs)
    }

    fn composite_file(builder: FileBuilder) -> Vec<u8> {
        builder
            .record_length(32)
            .key(KeySpec::single(SegmentSpec::new(codes::INTEGER, 0, 4)))
            .key(KeySpec::composite(vec![
                SegmentSpec::new(codes::ZSTRING, 20, 4),
                SegmentSpec::new(codes::INTEGER, 4, 8),
                SegmentSpec::new(codes::UNSIGNED_BINARY, 12, 2),
            ]))
            .key(KeySpec::single(SegmentSpec::new(codes::AUTOINC, 28, 4)))
            .build()
    }

    fn assert_composite_layout(keys: &BTreeMap<u16, Key>) {
        assert_eq!(keys.len(), 3);
        let composite = &keys[&1];
        assert!(composite.is_composite());
        let layout: Vec<_> = composite
            .segments()
            .iter()
            .map(|s| (s.index, s.data_type, s.offset, s.length, s.is_segmented()))
            .collect();
        assert_eq!(
            layout,
            vec![
                (0, KeyDataType::Zstring, 20, 4, true),
                (1, KeyDataType::Integer, 4, 8, true),
                (2, KeyDataType::UnsignedBinary, 12, 2, false),
            ]
        );
        assert_eq!(keys[&2].primary_segment().unwrap().data_type, KeyDataType::AutoInc);
        assert_eq!(keys[&2].primary_segment().unwrap().number, 2);
    }

    #[test]
    fn v5_composite_keys() {
        let data = composite_file(FileBuilder::v5(512));
        assert_composite_layout(&keys_of(&data, None).unwrap());
    }

    #[test]
    fn v6_composite_keys_follow_kat() {
        let data = composite_file(FileBuilder::v6(1024));
        assert_composite_layout(&keys_of(&data, None).unwrap());
    }

    #[test]
    fn v6_kat_is_relative_to_active_fcr() {
        let data = composite_file(FileBuilder::v6(1024).fcr_usage_counts(1, 2));
        assert_composite_layout(&keys_of(&data, None).unwrap());
    }

    #[test]
    fn legacy_types_without_extended_flag() {
        let data = FileBuilder::v5(512)
            .record_length(8)
            .key(KeySpec::single(SegmentSpec::legacy(0, 4)))
            .key(KeySpec::single(
                SegmentSpec::legacy(4, 4).attributes(KeyAttributes::OLD_STYLE_BINARY.bits()),
            ))
            .build();
        let keys = keys_of(&data, None).unwrap();
        assert_eq!(keys[&0].segments()[0].data_type, KeyDataType::OldAscii);
        assert_eq!(keys[&1].segments()[0].data_type, KeyDataType::OldBinary);
    }

    #[test]
    fn reads_null_value_and_attributes() {
        let data = FileBuilder::v5(512)
            .record_length(16)
            .key(KeySpec::single(
                SegmentSpec::new(codes::ZSTRING, 2, 8)
                    .attributes((KeyAttributes::NULL_ALL_SEGMENTS | KeyAttributes::DUPLICATES).bits())
                    .null_value(b' '),
            ))
            .build();
        let keys = keys_of(&data, None).unwrap();
        let segment = &keys[&0].segments()[0];
        assert_eq!(segment.null_value, b' ');
        assert!(segment.is_nullable());
        assert!(segment.allows_duplicates());
        assert!(segment.attributes.contains(KeyAttributes::EXTENDED_DATA_TYPE));
    }

    #[test]
    fn acs_segment_without_table_fails() {
        let data = FileBuilder::v5(512)
            .record_length(8)
            .key(KeySpec::single(SegmentSpec::new(codes::ZSTRING, 0, 8).acs(0)))
            .build();
        let err = keys_of(&data, None).unwrap_err();
        assert!(err.to_string().contains("requires an ACS"));
    }

    #[test]
    fn acs_segment_binds_shared_table() {
        let data = FileBuilder::v5(512)
            .record_length(8)
            .key(KeySpec::single(SegmentSpec::new(codes::ZSTRING, 0, 8).acs(0x010203)))
            .build();
        let acs = Arc::new(AcsTable::new("UPPER", crate::acs::upper_case_table()));
        let keys = keys_of(&data, Some(&acs)).unwrap();
        let segment = &keys[&0].segments()[0];
        assert_eq!(segment.acs_number, 0x010203);
        assert!(Arc::ptr_eq(segment.acs.as_ref().unwrap(), &acs));
    }

    #[test]
    fn kat_count_mismatch_fails() {
        let mut data = composite_file(FileBuilder::v6(1024));
        data[0x76] = 7;
        let err = keys_of(&data, None).unwrap_err();
        assert!(err.to_string().contains("key allocation table"));
    }

    #[test]
    fn definition_past_page_end_fails() {
        let mut data = FileBuilder::v6(512)
            .record_length(8)
            .key(KeySpec::single(SegmentSpec::new(codes::INTEGER, 0, 4)))
            .build();
        let kat = usize::from(u16::from_le_bytes([data[0x78], data[0x79]]));
        data[kat..kat + 2].copy_from_slice(&500u16.to_le_bytes());
        assert!(keys_of(&data, None).is_err());
    }
}
