//! Export document shared by `view --format json` and `convert`.

use btrv_core::{BtrieveFile, Key, KeyValue, Record, Segment};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

/// A decoded file as written to disk by `convert`.
#[derive(Debug, Serialize)]
pub struct ExportDocument {
    /// File control record summary.
    pub file: FileSummary,
    /// Key definitions in key-number order.
    pub keys: Vec<KeyExport>,
    /// Records in physical order.
    pub records: Vec<RecordExport>,
}

/// Header fields worth keeping once the file is gone.
#[derive(Debug, Serialize)]
pub struct FileSummary {
    /// Source path, if the file came from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// "v5" or "v6".
    pub version: String,
    /// Page length in bytes.
    pub page_length: u16,
    /// Number of whole pages.
    pub page_count: usize,
    /// Logical record length.
    pub record_length: u16,
    /// Physical record length.
    pub physical_record_length: u16,
    /// Record count declared by the header.
    pub record_count: u32,
    /// Whether records carry a variable-length tail.
    pub variable_length: bool,
    /// Whether variable tails may be truncated.
    pub variable_truncation: bool,
    /// Whether a log key is present.
    pub log_key_present: bool,
    /// Name of the alternate collating sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acs: Option<String>,
    /// Non-fatal problems found while loading.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// One key definition.
#[derive(Debug, Serialize)]
pub struct KeyExport {
    /// Key number.
    pub number: u16,
    /// Total width of all segments.
    pub length: usize,
    /// Segments in index order.
    pub segments: Vec<SegmentExport>,
}

/// One key segment.
#[derive(Debug, Serialize)]
pub struct SegmentExport {
    /// Offset within the record.
    pub offset: u16,
    /// Width in bytes.
    pub length: u16,
    /// Data type name.
    pub data_type: String,
    /// Raw attribute bits.
    pub attributes: u16,
    /// Names of the set attribute bits.
    pub flags: Vec<String>,
    /// Null sentinel, for nullable segments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_value: Option<u8>,
}

/// One record with its decoded key values.
#[derive(Debug, Serialize)]
pub struct RecordExport {
    /// Absolute file offset.
    pub offset: u32,
    /// Record bytes as lowercase hex.
    pub data: String,
    /// Key number to decoded value.
    pub keys: BTreeMap<u16, Value>,
}

impl ExportDocument {
    /// Builds the document, keeping at most `limit` records.
    pub fn build(file: &BtrieveFile, limit: Option<usize>) -> Self {
        let take = limit.unwrap_or(usize::MAX);
        Self {
            file: FileSummary::from_file(file),
            keys: file.keys().values().map(KeyExport::from_key).collect(),
            records: file
                .records()
                .iter()
                .take(take)
                .map(|record| RecordExport::from_record(file, record))
                .collect(),
        }
    }
}

impl FileSummary {
    fn from_file(file: &BtrieveFile) -> Self {
        Self {
            path: file.path().map(|p| p.display().to_string()),
            version: file.version().to_string(),
            page_length: file.page_length(),
            page_count: file.page_count(),
            record_length: file.record_length(),
            physical_record_length: file.physical_record_length(),
            record_count: file.record_count(),
            variable_length: file.is_variable_length(),
            variable_truncation: file.is_variable_truncation(),
            log_key_present: file.log_key_present(),
            acs: file.acs().map(|acs| acs.name().to_string()),
            warnings: file.warnings().iter().map(ToString::to_string).collect(),
        }
    }
}

impl KeyExport {
    fn from_key(key: &Key) -> Self {
        Self {
            number: key.number(),
            length: key.length(),
            segments: key.segments().iter().map(SegmentExport::from_segment).collect(),
        }
    }
}

impl SegmentExport {
    fn from_segment(segment: &Segment) -> Self {
        Self {
            offset: segment.offset,
            length: segment.length,
            data_type: segment.data_type.to_string(),
            attributes: segment.attributes.bits(),
            flags: segment
                .attributes
                .iter_names()
                .map(|(name, _)| name.to_string())
                .collect(),
            null_value: segment.is_nullable().then_some(segment.null_value),
        }
    }
}

impl RecordExport {
    fn from_record(file: &BtrieveFile, record: &Record) -> Self {
        let keys = file
            .keys()
            .iter()
            .map(|(&number, key)| {
                let value = match key.extract(record.data()) {
                    Ok(value) => key_value_json(&value),
                    Err(e) => {
                        tracing::debug!(key = number, offset = record.offset(), error = %e, "key not extractable");
                        Value::Null
                    }
                };
                (number, value)
            })
            .collect();
        Self {
            offset: record.offset(),
            data: hex(record.data()),
            keys,
        }
    }
}

/// Maps a key value to JSON. Raw bytes become a hex string.
pub fn key_value_json(value: &KeyValue) -> Value {
    match value {
        KeyValue::Null => Value::Null,
        KeyValue::Integer(v) => Value::from(*v),
        KeyValue::Unsigned(v) => Value::from(*v),
        KeyValue::Text(s) => Value::from(s.as_str()),
        KeyValue::Bytes(b) => Value::from(hex(b)),
    }
}

/// Lowercase hex encoding.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use btrv_core::LoadOptions;
    use btrv_testkit::prelude::*;

    fn load(bytes: Vec<u8>) -> BtrieveFile {
        BtrieveFile::from_bytes(bytes, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex(&[0x00, 0x0A, 0xFF]), "000aff");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn key_values_map_to_json() {
        assert_eq!(key_value_json(&KeyValue::Null), Value::Null);
        assert_eq!(key_value_json(&KeyValue::Integer(-3343)), Value::from(-3343));
        assert_eq!(key_value_json(&KeyValue::Unsigned(0xF2F1)), Value::from(0xF2F1u64));
        assert_eq!(key_value_json(&KeyValue::Text("Test".into())), Value::from("Test"));
        assert_eq!(key_value_json(&KeyValue::Bytes(vec![1, 0xAB])), Value::from("01ab"));
    }

    #[test]
    fn document_covers_keys_and_records() {
        let file = load(user_table(FileVersion::V5).build());
        let doc = ExportDocument::build(&file, None);

        assert_eq!(doc.file.version, "v5");
        assert_eq!(doc.file.record_length, USER_RECORD_LENGTH);
        assert_eq!(doc.keys.len(), 4);
        assert_eq!(doc.records.len(), USER_ROWS.len());

        let (_, number, label, id) = USER_ROWS[0];
        let first = &doc.records[0];
        assert_eq!(first.keys[&1], Value::from(number));
        assert_eq!(first.keys[&2], Value::from(label));
        assert_eq!(first.keys[&3], Value::from(id));
        assert_eq!(first.data.len(), usize::from(USER_RECORD_LENGTH) * 2);
    }

    #[test]
    fn limit_truncates_records_only() {
        let file = load(user_table(FileVersion::V6).build());
        let doc = ExportDocument::build(&file, Some(1));
        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.keys.len(), 4);
    }

    #[test]
    fn segment_flags_are_named() {
        let file = load(composite_table(FileVersion::V6).build());
        let doc = ExportDocument::build(&file, Some(0));
        let composite = &doc.keys[1];
        assert_eq!(composite.segments.len(), 2);
        assert!(composite.segments[0].flags.iter().any(|f| f == "SEGMENTED"));
        assert!(composite.segments[0].flags.iter().any(|f| f == "DUPLICATES"));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["file"]["version"], "v6");
        assert!(json["records"].as_array().unwrap().is_empty());
    }
}
