//! Element-type descriptors for [`NdArray`](super::NdArray).
//!
//! A [`DType`] is a kind, an item size in bytes, a byte order and, for the
//! time kinds, a unit. It renders to the numpy-style descriptor string
//! (`<f8`, `|b1`, `<M8[us]`) and canonical name (`float64`, `complex256`).

use std::fmt;

/// Element kind, one per numpy kind code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeKind {
    Bool,
    Int,
    UInt,
    Float,
    Complex,
    DateTime,
    TimeDelta,
    Bytes,
    Unicode,
    Void,
    Object,
}

impl DTypeKind {
    /// The single-character kind code (`b`, `i`, `u`, `f`, `c`, `M`, `m`, `S`, `U`, `V`, `O`).
    pub fn code(self) -> char {
        match self {
            DTypeKind::Bool => 'b',
            DTypeKind::Int => 'i',
            DTypeKind::UInt => 'u',
            DTypeKind::Float => 'f',
            DTypeKind::Complex => 'c',
            DTypeKind::DateTime => 'M',
            DTypeKind::TimeDelta => 'm',
            DTypeKind::Bytes => 'S',
            DTypeKind::Unicode => 'U',
            DTypeKind::Void => 'V',
            DTypeKind::Object => 'O',
        }
    }

    /// Unsigned, signed, float or complex.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DTypeKind::UInt | DTypeKind::Int | DTypeKind::Float | DTypeKind::Complex
        )
    }
}

/// Byte order marker of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
    /// Single-byte and non-numeric layouts.
    NotApplicable,
}

impl ByteOrder {
    pub fn code(self) -> char {
        match self {
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
            ByteOrder::NotApplicable => '|',
        }
    }
}

/// Resolution of datetime and timedelta arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Year => "Y",
            TimeUnit::Month => "M",
            TimeUnit::Week => "W",
            TimeUnit::Day => "D",
            TimeUnit::Hour => "h",
            TimeUnit::Minute => "m",
            TimeUnit::Second => "s",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Microsecond => "us",
            TimeUnit::Nanosecond => "ns",
        }
    }
}

/// Element-type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DType {
    kind: DTypeKind,
    itemsize: usize,
    byte_order: ByteOrder,
    unit: Option<TimeUnit>,
}

impl DType {
    fn native(kind: DTypeKind, itemsize: usize) -> Self {
        let byte_order = if itemsize <= 1 {
            ByteOrder::NotApplicable
        } else {
            ByteOrder::Little
        };
        Self {
            kind,
            itemsize,
            byte_order,
            unit: None,
        }
    }

    fn unordered(kind: DTypeKind, itemsize: usize) -> Self {
        Self {
            kind,
            itemsize,
            byte_order: ByteOrder::NotApplicable,
            unit: None,
        }
    }

    pub fn bool() -> Self {
        Self::unordered(DTypeKind::Bool, 1)
    }

    /// Signed integer of `itemsize` bytes (1, 2, 4 or 8).
    pub fn int(itemsize: usize) -> Self {
        Self::native(DTypeKind::Int, itemsize)
    }

    /// Unsigned integer of `itemsize` bytes (1, 2, 4 or 8).
    pub fn uint(itemsize: usize) -> Self {
        Self::native(DTypeKind::UInt, itemsize)
    }

    /// Float of `itemsize` bytes (2, 4, 8, or the extended 12 and 16).
    pub fn float(itemsize: usize) -> Self {
        Self::native(DTypeKind::Float, itemsize)
    }

    /// Complex of `itemsize` bytes (8, 16, or the extended 24 and 32).
    pub fn complex(itemsize: usize) -> Self {
        Self::native(DTypeKind::Complex, itemsize)
    }

    pub fn datetime(unit: TimeUnit) -> Self {
        Self {
            unit: Some(unit),
            ..Self::native(DTypeKind::DateTime, 8)
        }
    }

    pub fn timedelta(unit: TimeUnit) -> Self {
        Self {
            unit: Some(unit),
            ..Self::native(DTypeKind::TimeDelta, 8)
        }
    }

    /// Fixed-width byte strings of `len` bytes.
    pub fn bytes(len: usize) -> Self {
        Self::unordered(DTypeKind::Bytes, len)
    }

    /// Fixed-width unicode strings of `chars` code points (4 bytes each).
    pub fn unicode(chars: usize) -> Self {
        Self::native(DTypeKind::Unicode, chars * 4)
    }

    /// Opaque record of `itemsize` bytes.
    pub fn void(itemsize: usize) -> Self {
        Self::unordered(DTypeKind::Void, itemsize)
    }

    pub fn object() -> Self {
        Self::unordered(DTypeKind::Object, 8)
    }

    /// Returns the same descriptor with the given byte order.
    ///
    /// Layouts without a byte order keep [`ByteOrder::NotApplicable`].
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        if self.byte_order != ByteOrder::NotApplicable {
            self.byte_order = byte_order;
        }
        self
    }

    pub fn kind(&self) -> DTypeKind {
        self.kind
    }

    pub fn itemsize(&self) -> usize {
        self.itemsize
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn unit(&self) -> Option<TimeUnit> {
        self.unit
    }

    /// `float128` or `complex256`.
    pub fn is_quad_precision(&self) -> bool {
        matches!(
            (self.kind, self.itemsize),
            (DTypeKind::Float, 16) | (DTypeKind::Complex, 32)
        )
    }

    /// Descriptor string such as `<f8`, `|b1`, `<M8[us]` or `<U5`.
    pub fn descr(&self) -> String {
        let size = match self.kind {
            DTypeKind::Unicode => self.itemsize / 4,
            _ => self.itemsize,
        };
        let mut out = format!("{}{}{}", self.byte_order.code(), self.kind.code(), size);
        if let Some(unit) = self.unit {
            out.push_str(&format!("[{}]", unit.suffix()));
        }
        out
    }

    /// Canonical name such as `float64`, `complex256` or `datetime64[us]`.
    pub fn name(&self) -> String {
        let bits = self.itemsize * 8;
        match self.kind {
            DTypeKind::Bool => "bool".to_string(),
            DTypeKind::Int => format!("int{bits}"),
            DTypeKind::UInt => format!("uint{bits}"),
            DTypeKind::Float => format!("float{bits}"),
            DTypeKind::Complex => format!("complex{bits}"),
            DTypeKind::DateTime | DTypeKind::TimeDelta => {
                let base = if self.kind == DTypeKind::DateTime {
                    "datetime64"
                } else {
                    "timedelta64"
                };
                match self.unit {
                    Some(unit) => format!("{base}[{}]", unit.suffix()),
                    None => base.to_string(),
                }
            }
            DTypeKind::Bytes => format!("bytes{bits}"),
            DTypeKind::Unicode => format!("str{bits}"),
            DTypeKind::Void => format!("void{bits}"),
            DTypeKind::Object => "object".to_string(),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_strings() {
        assert_eq!(DType::float(8).descr(), "<f8");
        assert_eq!(DType::bool().descr(), "|b1");
        assert_eq!(DType::int(1).descr(), "|i1");
        assert_eq!(DType::datetime(TimeUnit::Microsecond).descr(), "<M8[us]");
        assert_eq!(DType::timedelta(TimeUnit::Nanosecond).descr(), "<m8[ns]");
        assert_eq!(DType::unicode(5).descr(), "<U5");
        assert_eq!(DType::bytes(3).descr(), "|S3");
        assert_eq!(DType::void(16).descr(), "|V16");
        assert_eq!(
            DType::complex(16).with_byte_order(ByteOrder::Big).descr(),
            ">c16"
        );
    }

    #[test]
    fn names() {
        assert_eq!(DType::float(16).name(), "float128");
        assert_eq!(DType::float(12).name(), "float96");
        assert_eq!(DType::complex(32).name(), "complex256");
        assert_eq!(DType::uint(8).name(), "uint64");
        assert_eq!(DType::unicode(5).name(), "str160");
        assert_eq!(DType::datetime(TimeUnit::Microsecond).to_string(), "datetime64[us]");
    }

    #[test]
    fn byte_order_is_sticky_for_single_byte_layouts() {
        let dtype = DType::bool().with_byte_order(ByteOrder::Big);
        assert_eq!(dtype.byte_order(), ByteOrder::NotApplicable);
    }

    #[test]
    fn quad_precision() {
        assert!(DType::float(16).is_quad_precision());
        assert!(DType::complex(32).is_quad_precision());
        assert!(!DType::complex(16).is_quad_precision());
        assert!(!DType::float(12).is_quad_precision());
    }
}
