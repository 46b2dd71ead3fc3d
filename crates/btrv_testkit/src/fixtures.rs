//! Canned fixtures and on-disk helpers.
//!
//! The canned files mirror the layouts of small production databases: a
//! fixed-length user table and a variable-length blob table.

use crate::builder::{FileBuilder, FileVersion, KeySpec, SegmentSpec};
use crate::codes::{self, attr};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Record length of [`user_table`].
pub const USER_RECORD_LENGTH: u16 = 74;
/// Physical record length of [`user_table`].
pub const USER_PHYSICAL_LENGTH: u16 = 90;

/// Rows of [`user_table`]: (name, number, label, id).
pub const USER_ROWS: [(&str, i32, &str, u32); 4] = [
    ("Sysop", 3444, "3444", 1),
    ("Sysop", 7776, "7776", 2),
    ("Sysop", 1_052_234_073, "StringValue", 3),
    ("Sysop", -615_634_567, "stringValue", 4),
];

/// Number of records in [`variable_table`].
pub const VARIABLE_RECORDS: usize = 1024;

/// Fixed prefix of every [`variable_table`] record.
pub const VARIABLE_MAGIC: u32 = 0xDEAD_BEEF;

fn builder(version: FileVersion, page_length: u16) -> FileBuilder {
    match version {
        FileVersion::V5 => FileBuilder::v5(page_length),
        FileVersion::V6 => FileBuilder::v6(page_length),
    }
}

/// Encodes one [`USER_ROWS`] row.
pub fn user_record(name: &str, number: i32, label: &str, id: u32) -> Vec<u8> {
    let mut record = vec![0u8; usize::from(USER_RECORD_LENGTH)];
    record[0..2].copy_from_slice(&(id as u16).to_le_bytes());
    record[2..2 + name.len()].copy_from_slice(name.as_bytes());
    record[34..38].copy_from_slice(&number.to_le_bytes());
    record[38..38 + label.len()].copy_from_slice(label.as_bytes());
    record[70..74].copy_from_slice(&id.to_le_bytes());
    record
}

/// Four-key fixed-length table.
///
/// Keys: 0 zstring @2 len 32 (duplicates), 1 integer @34 len 4
/// (modifiable), 2 zstring @38 len 32 (duplicates, modifiable),
/// 3 autoinc @70 len 4.
pub fn user_table(version: FileVersion) -> FileBuilder {
    builder(version, 512)
        .record_length(USER_RECORD_LENGTH)
        .physical_record_length(USER_PHYSICAL_LENGTH)
        .key(KeySpec::single(
            SegmentSpec::new(codes::ZSTRING, 2, 32).attributes(attr::DUPLICATES),
        ))
        .key(KeySpec::single(
            SegmentSpec::new(codes::INTEGER, 34, 4).attributes(attr::MODIFIABLE),
        ))
        .key(KeySpec::single(
            SegmentSpec::new(codes::ZSTRING, 38, 32).attributes(attr::DUPLICATES | attr::MODIFIABLE),
        ))
        .key(KeySpec::single(SegmentSpec::new(codes::AUTOINC, 70, 4)))
        .records(USER_ROWS.iter().map(|&(n, v, l, id)| user_record(n, v, l, id)))
}

/// Encodes record `i` of [`variable_table`]: magic, `i % 64`, `i`, then a
/// tail of `i` bytes where byte `j` is `j`.
pub fn variable_record(i: usize) -> Vec<u8> {
    let mut record = Vec::with_capacity(8 + i);
    record.extend_from_slice(&VARIABLE_MAGIC.to_le_bytes());
    record.extend_from_slice(&((i % 64) as u16).to_le_bytes());
    record.extend_from_slice(&(i as u16).to_le_bytes());
    record.extend((0..i).map(|j| j as u8));
    record
}

/// 1024 variable-length records spread over many pages and, for v6, many
/// PAT groups.
///
/// Keys: 0 integer @4 len 2 (duplicates), 1 integer @6 len 2.
pub fn variable_table(version: FileVersion) -> FileBuilder {
    builder(version, 512)
        .record_length(8)
        .physical_record_length(20)
        .variable_length(true)
        .key(KeySpec::single(
            SegmentSpec::new(codes::INTEGER, 4, 2).attributes(attr::DUPLICATES),
        ))
        .key(KeySpec::single(SegmentSpec::new(codes::INTEGER, 6, 2)))
        .records((0..VARIABLE_RECORDS).map(variable_record))
}

/// Three keys, the middle one composite with segments stored out of record
/// order.
pub fn composite_table(version: FileVersion) -> FileBuilder {
    let page_length = match version {
        FileVersion::V5 => 512,
        FileVersion::V6 => 1024,
    };
    let records = (0..10u8).map(|i| {
        let mut record = vec![0u8; 32];
        record[0..4].copy_from_slice(&u32::from(i + 1).to_le_bytes());
        record[4..8].copy_from_slice(&(1000 - i32::from(i)).to_le_bytes());
        record[8..12].fill(0x05);
        record[20..24].copy_from_slice(if i % 2 == 0 { b"EVEN" } else { b"ODD\0" });
        record
    });
    builder(version, page_length)
        .record_length(32)
        .key(KeySpec::single(SegmentSpec::new(codes::AUTOINC, 0, 4)))
        .key(KeySpec::composite(vec![
            SegmentSpec::new(codes::ZSTRING, 20, 4).attributes(attr::DUPLICATES),
            SegmentSpec::new(codes::INTEGER, 4, 4),
        ]))
        .key(KeySpec::single(SegmentSpec::new(codes::UNSIGNED_BINARY, 8, 4)))
        .records(records)
}

/// A file written into its own temporary directory.
#[derive(Debug)]
pub struct TempFixture {
    dir: TempDir,
    path: PathBuf,
}

impl TempFixture {
    /// Writes `bytes` to `name` inside a fresh temporary directory.
    pub fn new(name: &str, bytes: &[u8]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join(name);
        fs::write(&path, bytes).expect("Failed to write fixture");
        Self { dir, path }
    }

    /// Path of the written file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The temporary directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a sibling file that may not exist yet.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
