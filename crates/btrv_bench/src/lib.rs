//! Benchmark utilities.

use btrv_testkit::{codes, FileBuilder, FileVersion, KeySpec, SegmentSpec};

/// A fixed-length file of `count` 64-byte records with an integer key and a
/// zstring key.
pub fn fixed_file(version: FileVersion, count: usize) -> Vec<u8> {
    let builder = match version {
        FileVersion::V5 => FileBuilder::v5(4096),
        FileVersion::V6 => FileBuilder::v6(4096),
    };
    builder
        .record_length(64)
        .key(KeySpec::single(SegmentSpec::new(codes::INTEGER, 0, 4)))
        .key(KeySpec::single(SegmentSpec::new(codes::ZSTRING, 8, 32)))
        .records((0..count).map(fixed_record))
        .build()
}

/// Record `i` of [`fixed_file`].
pub fn fixed_record(i: usize) -> Vec<u8> {
    let mut record = vec![0u8; 64];
    record[0..4].copy_from_slice(&(i as i32).wrapping_mul(7919).to_le_bytes());
    record[4..8].copy_from_slice(&(i as u32 + 1).to_le_bytes());
    let name = format!("record-{i:06}");
    record[8..8 + name.len()].copy_from_slice(name.as_bytes());
    record
}

/// A variable-length file whose record `i` carries a tail of `i % max_tail`
/// bytes.
pub fn variable_file(version: FileVersion, count: usize, max_tail: usize) -> Vec<u8> {
    let builder = match version {
        FileVersion::V5 => FileBuilder::v5(4096),
        FileVersion::V6 => FileBuilder::v6(4096),
    };
    builder
        .record_length(8)
        .variable_length(true)
        .key(KeySpec::single(SegmentSpec::new(codes::UNSIGNED_BINARY, 4, 4)))
        .records((0..count).map(|i| {
            let mut record = vec![0xAB; 4];
            record.extend_from_slice(&(i as u32).to_le_bytes());
            record.extend((0..i % max_tail).map(|j| j as u8));
            record
        }))
        .build()
}
