//! Bounds-checked little-endian readers over the file image.

use crate::error::{BtrieveError, BtrieveResult};

/// Returns `len` bytes at `offset`, or a format error if they are not there.
pub(crate) fn slice(data: &[u8], offset: usize, len: usize) -> BtrieveResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            BtrieveError::invalid_format(format!(
                "read of {len} bytes at offset {offset:#x} overruns {} bytes",
                data.len()
            ))
        })
}

pub(crate) fn u8_at(data: &[u8], offset: usize) -> BtrieveResult<u8> {
    Ok(slice(data, offset, 1)?[0])
}

pub(crate) fn u16_le(data: &[u8], offset: usize) -> BtrieveResult<u16> {
    let b = slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn u32_le(data: &[u8], offset: usize) -> BtrieveResult<u32> {
    let b = slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Free-list pointer: high word then low word, each little-endian.
pub(crate) fn record_pointer(b: &[u8]) -> u32 {
    (u32::from(u16::from_le_bytes([b[0], b[1]])) << 16) | u32::from(u16::from_le_bytes([b[2], b[3]]))
}

/// 24-bit page number stored high, low, mid.
pub(crate) fn packed_page(b: &[u8]) -> u32 {
    (u32::from(b[0]) << 16) | u32::from(b[1]) | (u32::from(b[2]) << 8)
}
