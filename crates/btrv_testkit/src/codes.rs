//! On-disk constants used when building fixtures.

/// Fixed-length string.
pub const STRING: u8 = 0;
/// Signed integer.
pub const INTEGER: u8 = 1;
/// IEEE float.
pub const FLOAT: u8 = 2;
/// Length-prefixed string.
pub const LSTRING: u8 = 10;
/// Zero-terminated string.
pub const ZSTRING: u8 = 11;
/// Unsigned integer.
pub const UNSIGNED_BINARY: u8 = 14;
/// Autoincrement integer.
pub const AUTOINC: u8 = 15;

/// Key attribute bits.
pub mod attr {
    /// Duplicates allowed.
    pub const DUPLICATES: u16 = 0x0001;
    /// Modifiable.
    pub const MODIFIABLE: u16 = 0x0002;
    /// Legacy binary.
    pub const OLD_STYLE_BINARY: u16 = 0x0004;
    /// Null when all segments hold the sentinel.
    pub const NULL_ALL_SEGMENTS: u16 = 0x0008;
    /// Another segment follows.
    pub const SEGMENTED: u16 = 0x0010;
    /// Uses the ACS.
    pub const NUMBERED_ACS: u16 = 0x0020;
    /// Explicit data type.
    pub const EXTENDED_DATA_TYPE: u16 = 0x0100;
}
