//! MAT Level 5 data types, array classes and flags.

/// Data element types (`miINT8` ... `miUTF8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MiType {
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Single = 7,
    Double = 9,
    Int64 = 12,
    UInt64 = 13,
    Matrix = 14,
    Compressed = 15,
    Utf8 = 16,
}

impl MiType {
    /// Size in bytes of one value of this type.
    pub fn width(self) -> usize {
        match self {
            MiType::Int8 | MiType::UInt8 | MiType::Utf8 => 1,
            MiType::Int16 | MiType::UInt16 => 2,
            MiType::Int32 | MiType::UInt32 | MiType::Single => 4,
            _ => 8,
        }
    }
}

/// Array classes stored in the array flags sub-element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MxClass {
    Cell = 1,
    Struct = 2,
    Object = 3,
    Char = 4,
    Double = 6,
    Single = 7,
    Int8 = 8,
    UInt8 = 9,
    Int16 = 10,
    UInt16 = 11,
    Int32 = 12,
    UInt32 = 13,
    Int64 = 14,
    UInt64 = 15,
}

pub const FLAG_COMPLEX: u32 = 0x0800;
pub const FLAG_LOGICAL: u32 = 0x0200;

pub const HEADER_TEXT_LEN: usize = 116;
pub const HEADER_LEN: usize = 128;
pub const VERSION: u16 = 0x0100;
pub const ENDIAN_INDICATOR: &[u8; 2] = b"IM";

/// Longest field name with long field names enabled.
pub const LONG_FIELD_NAME_MAX: usize = 63;
pub const FIELD_NAME_MAX: usize = 31;

/// Bytes of payload a small data element can hold.
pub const SMALL_ELEMENT_MAX: usize = 4;
