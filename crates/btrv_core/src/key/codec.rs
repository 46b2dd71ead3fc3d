//! Key value decoding.
//!
//! Per segment the raw window is read and substituted through the ACS when
//! the segment asks for it. The substituted bytes are null-checked, and a
//! single segment is then decoded by type:
//!
//! - signed integers sign-extend their little-endian bytes to `i64`
//! - unsigned and legacy binary values zero-extend to `u64`
//! - strings are cut at the first NUL
//! - anything else is kept as raw bytes
//!
//! Composite keys skip typed decoding and compare as the concatenation of
//! their windows.

use super::segment::Segment;
use std::fmt;

/// A decoded key value. Values of one key are totally ordered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    /// Every byte of a null-flagged segment held its sentinel.
    Null,
    /// Signed integer.
    Integer(i64),
    /// Unsigned integer.
    Unsigned(u64),
    /// Text cut at the first NUL.
    Text(String),
    /// Raw bytes (composite keys and untyped segments).
    Bytes(Vec<u8>),
}

impl KeyValue {
    /// True for [`KeyValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Sign-extends up to 8 little-endian bytes to an `i64`.
///
/// Returns `None` for an empty slice or one wider than 8 bytes.
#[must_use]
pub fn sign_extend(bytes: &[u8]) -> Option<i64> {
    let last = *bytes.last()?;
    if bytes.len() > 8 {
        return None;
    }
    let mut buf = if last & 0x80 != 0 { [0xFF; 8] } else { [0; 8] };
    buf[..bytes.len()].copy_from_slice(bytes);
    Some(i64::from_le_bytes(buf))
}

/// Zero-extends up to 8 little-endian bytes to a `u64`.
///
/// Returns `None` for an empty slice or one wider than 8 bytes.
#[must_use]
pub fn zero_extend(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    Some(u64::from_le_bytes(buf))
}

/// Decodes the raw windows of `segments` (same order) into a key value.
///
/// Null sentinels are compared after ACS substitution.
pub(crate) fn decode(segments: &[Segment], windows: &[&[u8]]) -> KeyValue {
    let mut substituted: Vec<Vec<u8>> = segments
        .iter()
        .zip(windows)
        .map(|(segment, window)| {
            let mut bytes = window.to_vec();
            if segment.requires_acs() {
                if let Some(acs) = &segment.acs {
                    acs.apply(&mut bytes);
                }
            }
            bytes
        })
        .collect();

    let null = segments
        .iter()
        .zip(&substituted)
        .any(|(segment, bytes)| segment.is_nullable() && bytes.iter().all(|&b| b == segment.null_value));
    if null {
        return KeyValue::Null;
    }

    match segments {
        [segment] => decode_single(segment, substituted.pop().unwrap_or_default()),
        _ => KeyValue::Bytes(substituted.concat()),
    }
}

fn decode_single(segment: &Segment, bytes: Vec<u8>) -> KeyValue {
    let data_type = segment.data_type;
    if data_type.is_signed() {
        if let Some(v) = sign_extend(&bytes) {
            return KeyValue::Integer(v);
        }
    } else if data_type.is_unsigned() {
        if let Some(v) = zero_extend(&bytes) {
            return KeyValue::Unsigned(v);
        }
    } else if data_type.is_string() {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        return KeyValue::Text(String::from_utf8_lossy(&bytes[..end]).into_owned());
    }
    KeyValue::Bytes(bytes)
}
