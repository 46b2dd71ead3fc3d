//! File Control Record parsing and validation.
//!
//! The FCR is the first page of every Btrieve file (v6 keeps two redundant
//! copies). [`Header::parse`] reads every scalar the loader needs into an
//! immutable snapshot and rejects files the decoder cannot handle.

use crate::bytes::{slice, u16_le, u32_le, u8_at};
use crate::error::{BtrieveError, BtrieveResult};
use crate::types::FormatVersion;
use tracing::debug;

/// Bytes needed to read every FCR field.
pub const MIN_HEADER_LEN: usize = 0x10E;

const V6_MAGIC: [u8; 4] = [b'F', b'C', 0, 0];

const PAGE_LENGTH: usize = 0x08;
const ACCEL_FLAGS: usize = 0x0A;
const FREE_LIST_HEAD: usize = 0x10;
const KEY_COUNT: usize = 0x14;
const RECORD_LENGTH: usize = 0x16;
const PHYSICAL_RECORD_LENGTH: usize = 0x18;
const RECORD_COUNT_HIGH: usize = 0x1A;
const RECORD_COUNT_LOW: usize = 0x1C;
const NEEDS_RECOVERY: usize = 0x22;
const VARIABLE_MARKER: usize = 0x38;
const DUPLICATE_OFFSET: usize = 0x72;
const DUPLICATE_COUNT: usize = 0x74;
const KAT_COUNT: usize = 0x76;
const KAT_OFFSET: usize = 0x78;
const USER_FLAGS: usize = 0x106;
const LOG_KEY: usize = 0x10C;

const USER_FLAG_VARIABLE: u16 = 0x01;
const USER_FLAG_TRUNCATION: u16 = 0x02;
const USER_FLAG_COMPRESSED: u16 = 0x08;

/// Size of the page header preceding the record slots of a data page.
pub const DATA_PAGE_HEADER_LEN: usize = 6;

/// Immutable snapshot of the File Control Record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Detected format generation.
    pub version: FormatVersion,
    /// Index of the authoritative FCR page (always 0 for v5).
    pub fcr_page: usize,
    /// Page size in bytes.
    pub page_length: u16,
    /// Accelerated-access flags. Always zero for loadable files.
    pub accel_flags: u16,
    /// Raw user flags word.
    pub user_flags: u16,
    /// Number of logical keys.
    pub key_count: u16,
    /// Logical record length.
    pub record_length: u16,
    /// Stored record length including per-slot overhead.
    pub physical_record_length: u16,
    /// Number of records the file claims to hold.
    pub record_count: u32,
    /// Records carry a variable-length tail.
    pub variable_length: bool,
    /// Variable-length tails may be truncated.
    pub variable_truncation: bool,
    /// A log key is present.
    pub log_key_present: bool,
    /// Head of the deleted-record chain (v5).
    pub free_list_head: u32,
    /// Offset of the duplicate pointers in each record.
    pub duplicate_offset: u16,
    /// Number of duplicate pointers.
    pub duplicate_count: u8,
    /// Key count recorded in the key allocation table (v6).
    pub kat_count: u8,
    /// FCR-relative offset of the key allocation table (v6).
    pub kat_offset: u16,
}

impl Header {
    /// Parses and validates the FCR of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`BtrieveError::InvalidFormat`] if the magic, page length,
    /// version code, flags or record lengths are not acceptable.
    pub fn parse(data: &[u8]) -> BtrieveResult<Self> {
        let version = detect_version(data)?;

        if data.len() < MIN_HEADER_LEN {
            return Err(BtrieveError::invalid_format(format!(
                "file is {} bytes, shorter than a file control record",
                data.len()
            )));
        }

        let page_length = u16_le(data, PAGE_LENGTH)?;
        if page_length == 0 || page_length % 512 != 0 {
            return Err(BtrieveError::invalid_format(format!(
                "page length {page_length} is not a positive multiple of 512"
            )));
        }
        let pl = usize::from(page_length);

        let fcr_pages = match version {
            FormatVersion::V5 => 1,
            FormatVersion::V6 => 2,
        };
        if data.len() < pl * fcr_pages {
            return Err(BtrieveError::invalid_format(format!(
                "file is {} bytes, shorter than its {fcr_pages} control page(s) of {pl} bytes",
                data.len()
            )));
        }

        let fcr_page = match version {
            FormatVersion::V5 => {
                let code = u16::from_be_bytes([data[6], data[7]]);
                if !(3..=5).contains(&code) {
                    return Err(BtrieveError::invalid_format(format!(
                        "invalid v5 version code {code}"
                    )));
                }
                0
            }
            FormatVersion::V6 => {
                let first = u32_le(data, 4)?;
                let second = u32_le(data, pl + 4)?;
                debug!(first, second, "v6 FCR usage counts");
                if second > first {
                    1
                } else {
                    0
                }
            }
        };

        let fcr = slice(data, fcr_page * pl, pl)?;

        if version == FormatVersion::V5 && fcr[NEEDS_RECOVERY] == 0xFF && fcr[NEEDS_RECOVERY + 1] == 0xFF {
            return Err(BtrieveError::invalid_format(
                "file is marked inconsistent and needs recovery",
            ));
        }

        let accel_flags = u16_le(fcr, ACCEL_FLAGS)?;
        if accel_flags != 0 {
            return Err(BtrieveError::invalid_format(format!(
                "unsupported accel flags {accel_flags:#06x}"
            )));
        }

        let user_flags = u16_le(fcr, USER_FLAGS)?;
        if user_flags & USER_FLAG_COMPRESSED != 0 {
            return Err(BtrieveError::invalid_format("compressed data is not supported"));
        }
        let variable_length = user_flags & USER_FLAG_VARIABLE != 0;
        let variable_truncation = user_flags & USER_FLAG_TRUNCATION != 0;
        if variable_length != (u8_at(fcr, VARIABLE_MARKER)? == 0xFF) {
            return Err(BtrieveError::invalid_format("mismatched variable length flags"));
        }

        let record_length = u16_le(fcr, RECORD_LENGTH)?;
        let physical_record_length = u16_le(fcr, PHYSICAL_RECORD_LENGTH)?;
        if physical_record_length == 0 || physical_record_length < record_length {
            return Err(BtrieveError::invalid_format(format!(
                "physical record length {physical_record_length} is smaller than record length {record_length}"
            )));
        }

        let record_count = (u32::from(u16_le(fcr, RECORD_COUNT_HIGH)?) << 16)
            | u32::from(u16_le(fcr, RECORD_COUNT_LOW)?);

        Ok(Self {
            version,
            fcr_page,
            page_length,
            accel_flags,
            user_flags,
            key_count: u16_le(fcr, KEY_COUNT)?,
            record_length,
            physical_record_length,
            record_count,
            variable_length,
            variable_truncation,
            log_key_present: u8_at(fcr, LOG_KEY)? == 1,
            free_list_head: crate::bytes::record_pointer(slice(fcr, FREE_LIST_HEAD, 4)?),
            duplicate_offset: u16_le(fcr, DUPLICATE_OFFSET)?,
            duplicate_count: u8_at(fcr, DUPLICATE_COUNT)?,
            kat_count: u8_at(fcr, KAT_COUNT)?,
            kat_offset: u16_le(fcr, KAT_OFFSET)?,
        })
    }

    /// Absolute offset of the authoritative FCR page.
    #[must_use]
    pub fn fcr_offset(&self) -> usize {
        self.fcr_page * usize::from(self.page_length)
    }

    /// Number of pages following the first one.
    #[must_use]
    pub fn page_count(&self, file_len: usize) -> usize {
        (file_len / usize::from(self.page_length)).saturating_sub(1)
    }

    /// Number of record slots on a data page.
    #[must_use]
    pub fn records_per_page(&self) -> usize {
        (usize::from(self.page_length) - DATA_PAGE_HEADER_LEN) / usize::from(self.physical_record_length)
    }

    /// Bytes between the start of a slot and the record data.
    #[must_use]
    pub fn data_offset(&self) -> usize {
        self.version.slot_prefix()
    }
}

/// Determines the format generation from the first four bytes.
///
/// # Errors
///
/// Fails if the bytes are neither the v6 magic nor all zero.
pub fn detect_version(data: &[u8]) -> BtrieveResult<FormatVersion> {
    let magic = slice(data, 0, 4)
        .map_err(|_| BtrieveError::invalid_format(format!("file is only {} bytes", data.len())))?;
    if magic == V6_MAGIC {
        Ok(FormatVersion::V6)
    } else if magic.iter().all(|&b| b == 0) {
        Ok(FormatVersion::V5)
    } else {
        Err(BtrieveError::invalid_format(format!(
            "unrecognized file signature {magic:02x?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btrv_testkit::{codes, FileBuilder, KeySpec, SegmentSpec};

    fn v5_file() -> Vec<u8> {
        FileBuilder::v5(512)
            .record_length(16)
            .key(KeySpec::single(SegmentSpec::new(codes::INTEGER, 0, 4)))
            .record(vec![7u8; 16])
            .build()
    }

    fn v6_file() -> FileBuilder {
        FileBuilder::v6(1024)
            .record_length(16)
            .key(KeySpec::single(SegmentSpec::new(codes::INTEGER, 0, 4)))
            .record(vec![7u8; 16])
    }

    #[test]
    fn detects_versions() {
        assert_eq!(detect_version(&v5_file()).unwrap(), FormatVersion::V5);
        assert_eq!(detect_version(&v6_file().build()).unwrap(), FormatVersion::V6);
        assert!(detect_version(b"FC\0").is_err());
        assert!(detect_version(b"FC\0\x01").is_err());
    }

    #[test]
    fn parses_v5_scalars() {
        let data = v5_file();
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.version, FormatVersion::V5);
        assert_eq!(header.fcr_page, 0);
        assert_eq!(header.page_length, 512);
        assert_eq!(header.key_count, 1);
        assert_eq!(header.record_length, 16);
        assert_eq!(header.physical_record_length, 16);
        assert_eq!(header.record_count, 1);
        assert!(!header.variable_length);
        assert_eq!(header.free_list_head, 0xFFFF_FFFF);
        assert_eq!(header.data_offset(), 0);
        assert_eq!(header.records_per_page(), (512 - 6) / 16);
        assert_eq!(header.page_count(data.len()), data.len() / 512 - 1);
    }

    #[test]
    fn v6_prefers_larger_usage_count() {
        let header = Header::parse(&v6_file().fcr_usage_counts(3, 9).build()).unwrap();
        assert_eq!(header.fcr_page, 1);
        assert_eq!(header.fcr_offset(), 1024);
        assert_eq!(header.data_offset(), 2);

        let header = Header::parse(&v6_file().fcr_usage_counts(9, 3).build()).unwrap();
        assert_eq!(header.fcr_page, 0);
    }

    #[test]
    fn v6_tie_favors_first_page() {
        let header = Header::parse(&v6_file().fcr_usage_counts(4, 4).build()).unwrap();
        assert_eq!(header.fcr_page, 0);
    }

    #[test]
    fn rejects_short_file() {
        let data = v5_file();
        assert!(Header::parse(&data[..0x100]).is_err());
    }

    #[test]
    fn rejects_bad_page_length() {
        let mut data = v5_file();
        data[PAGE_LENGTH..PAGE_LENGTH + 2].copy_from_slice(&500u16.to_le_bytes());
        assert!(Header::parse(&data).is_err());
        data[PAGE_LENGTH..PAGE_LENGTH + 2].copy_from_slice(&0u16.to_le_bytes());
        assert!(Header::parse(&data).is_err());
    }

    #[test]
    fn rejects_bad_v5_version_code() {
        let mut data = v5_file();
        data[7] = 6;
        assert!(Header::parse(&data).is_err());
        data[7] = 3;
        assert!(Header::parse(&data).is_ok());
    }

    #[test]
    fn rejects_needs_recovery() {
        let mut data = v5_file();
        data[NEEDS_RECOVERY] = 0xFF;
        data[NEEDS_RECOVERY + 1] = 0xFF;
        let err = Header::parse(&data).unwrap_err();
        assert!(err.to_string().contains("recovery"));
    }

    #[test]
    fn rejects_accel_flags_and_compression() {
        let mut data = v5_file();
        data[ACCEL_FLAGS] = 1;
        assert!(Header::parse(&data).is_err());

        let mut data = v5_file();
        data[USER_FLAGS] |= USER_FLAG_COMPRESSED as u8;
        let err = Header::parse(&data).unwrap_err();
        assert!(err.to_string().contains("compressed"));
    }

    #[test]
    fn variable_flags_must_agree() {
        let mut data = v5_file();
        data[USER_FLAGS] |= USER_FLAG_VARIABLE as u8;
        assert!(Header::parse(&data).is_err());
        data[VARIABLE_MARKER] = 0xFF;
        let header = Header::parse(&data).unwrap();
        assert!(header.variable_length);
    }

    #[test]
    fn rejects_short_physical_length() {
        let mut data = v5_file();
        data[PHYSICAL_RECORD_LENGTH..PHYSICAL_RECORD_LENGTH + 2].copy_from_slice(&8u16.to_le_bytes());
        assert!(Header::parse(&data).is_err());
    }
}
