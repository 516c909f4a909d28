use std::fmt;

use bytes::Bytes;

/// Primitive field kinds of the ping protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    U8,
    U16,
    U32,
    Char,
    /// Trailing byte array sized by the frame length.
    ByteArray,
}

impl FieldType {
    /// Resolve a definition type tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "u8" => Some(Self::U8),
            "u16" => Some(Self::U16),
            "u32" => Some(Self::U32),
            "char" => Some(Self::Char),
            "vector" => Some(Self::ByteArray),
            _ => None,
        }
    }

    /// The definition type tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::Char => "char",
            Self::ByteArray => "vector",
        }
    }

    /// Wire width in bytes; `None` for the variable-length byte array.
    pub fn width(self) -> Option<usize> {
        match self {
            Self::U8 | Self::Char => Some(1),
            Self::U16 => Some(2),
            Self::U32 => Some(4),
            Self::ByteArray => None,
        }
    }

    /// Largest unsigned value the field holds.
    pub fn max_unsigned(self) -> Option<u64> {
        match self {
            Self::U8 => Some(u64::from(u8::MAX)),
            Self::U16 => Some(u64::from(u16::MAX)),
            Self::U32 => Some(u64::from(u32::MAX)),
            Self::Char | Self::ByteArray => None,
        }
    }

    pub fn is_variable(self) -> bool {
        self == Self::ByteArray
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Value of a `u8`, `u16` or `u32` field.
    Unsigned(u64),
    /// A single `char` byte.
    Char(u8),
    /// The trailing byte array.
    Bytes(Bytes),
}

impl Value {
    /// Short name of the value kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unsigned(_) => "unsigned",
            Value::Char(_) => "char",
            Value::Bytes(_) => "bytes",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Unsigned(u64::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Unsigned(u64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Unsigned(u64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Unsigned(v)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}
