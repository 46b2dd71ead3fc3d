//! Key data types.

use std::fmt;

/// Data type of a key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDataType {
    /// Fixed-length string.
    String,
    /// Signed little-endian integer.
    Integer,
    /// IEEE float.
    Float,
    /// Packed date.
    Date,
    /// Packed time.
    Time,
    /// Packed decimal.
    Decimal,
    /// Packed money.
    Money,
    /// Logical value.
    Logical,
    /// ASCII numeric.
    Numeric,
    /// Microsoft binary float.
    Bfloat,
    /// Length-prefixed string.
    Lstring,
    /// Zero-terminated string.
    Zstring,
    /// Note.
    Note,
    /// Length-prefixed variable data.
    Lvar,
    /// Unsigned little-endian integer.
    UnsignedBinary,
    /// Unsigned integer named apart from [`KeyDataType::UnsignedBinary`].
    ///
    /// Decoded the same way. No extended type code maps here since code 13
    /// is `Lvar`; it exists for keys built in code.
    Unsigned,
    /// Autoincrement integer.
    AutoInc,
    /// Bit field.
    Bit,
    /// Numeric with trailing sign.
    NumericSts,
    /// Legacy ASCII string (no extended type).
    OldAscii,
    /// Legacy binary value (no extended type).
    OldBinary,
    /// Extended type code this decoder does not recognize.
    Other(u8),
}

impl KeyDataType {
    /// Maps an extended data type code.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::String,
            1 => Self::Integer,
            2 => Self::Float,
            3 => Self::Date,
            4 => Self::Time,
            5 => Self::Decimal,
            6 => Self::Money,
            7 => Self::Logical,
            8 => Self::Numeric,
            9 => Self::Bfloat,
            10 => Self::Lstring,
            11 => Self::Zstring,
            12 => Self::Note,
            13 => Self::Lvar,
            14 => Self::UnsignedBinary,
            15 => Self::AutoInc,
            16 => Self::Bit,
            17 => Self::NumericSts,
            other => Self::Other(other),
        }
    }

    /// Sign-extended integer types.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Integer | Self::AutoInc)
    }

    /// Zero-extended integer types.
    #[must_use]
    pub const fn is_unsigned(self) -> bool {
        matches!(self, Self::UnsignedBinary | Self::Unsigned | Self::OldBinary)
    }

    /// Types decoded as NUL-terminated text.
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::String | Self::Lstring | Self::Zstring | Self::OldAscii)
    }
}

impl fmt::Display for KeyDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "Other({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}
