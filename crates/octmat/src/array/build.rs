//! Homogeneous array construction from nested sequences.

use super::{ArrayData, ArrayError, Complex64, DType, NdArray};
use crate::Value;

/// A flattened element awaiting kind promotion.
enum Leaf<'a> {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(Complex64),
    Str(&'a str),
    Other(Value),
}

impl<'a> Leaf<'a> {
    fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Bool(b) => Leaf::Bool(*b),
            Value::Int(i) => Leaf::Int(*i),
            Value::UInt(u) => Leaf::UInt(*u),
            Value::Float(f) => Leaf::Float(*f),
            Value::Complex(c) => Leaf::Complex(*c),
            Value::Str(s) => Leaf::Str(s),
            other => Leaf::Other(other.clone()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Leaf::Bool(b) => Value::Bool(b),
            Leaf::Int(i) => Value::Int(i),
            Leaf::UInt(u) => Value::UInt(u),
            Leaf::Float(f) => Value::Float(f),
            Leaf::Complex(c) => Value::Complex(c),
            Leaf::Str(s) => Value::Str(s.to_string()),
            Leaf::Other(v) => v,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Leaf::Bool(b) => f64::from(u8::from(*b)),
            Leaf::Int(i) => *i as f64,
            Leaf::UInt(u) => *u as f64,
            Leaf::Float(f) => *f,
            _ => f64::NAN,
        }
    }

    fn as_complex(&self) -> Complex64 {
        match self {
            Leaf::Complex(c) => *c,
            other => Complex64::new(other.as_f64(), 0.0),
        }
    }
}

fn push_array_leaves<'a>(array: &'a NdArray, out: &mut Vec<Leaf<'a>>) {
    match array.data() {
        ArrayData::Bool(v) => out.extend(v.iter().map(|b| Leaf::Bool(*b))),
        ArrayData::Int(v) => out.extend(v.iter().map(|i| Leaf::Int(*i))),
        ArrayData::UInt(v) => out.extend(v.iter().map(|u| Leaf::UInt(*u))),
        ArrayData::Float(v) => out.extend(v.iter().map(|f| Leaf::Float(*f))),
        ArrayData::Complex(v) => out.extend(v.iter().map(|c| Leaf::Complex(*c))),
        ArrayData::Unicode(v) => out.extend(v.iter().map(|s| Leaf::Str(s))),
        ArrayData::Object(v) => out.extend(v.iter().map(Leaf::from_value)),
        ArrayData::Bytes(v) => out.extend(v.iter().map(|b| Leaf::Other(Value::Bytes(b.clone())))),
        ArrayData::DateTime(v) => {
            out.extend(v.iter().map(|t| element(array, ArrayData::DateTime(vec![*t]))))
        }
        ArrayData::TimeDelta(v) => {
            out.extend(v.iter().map(|t| element(array, ArrayData::TimeDelta(vec![*t]))))
        }
        ArrayData::Record { fields, rows } => out.extend(rows.iter().map(|row| {
            let data = ArrayData::Record {
                fields: fields.clone(),
                rows: vec![row.clone()],
            };
            element(array, data)
        })),
    }
}

/// Wraps one element of `array` as a zero-dimensional array of the same dtype.
fn element(array: &NdArray, data: ArrayData) -> Leaf<'static> {
    Leaf::Other(Value::Array(NdArray {
        dtype: array.dtype,
        shape: Vec::new(),
        data,
        class_name: array.class_name.clone(),
    }))
}

/// Shape implied by the first element at every nesting level.
fn probe_shape(value: &Value) -> Vec<usize> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            let mut shape = vec![items.len()];
            if let Some(first) = items.first() {
                shape.extend(probe_shape(first));
            }
            shape
        }
        Value::Array(array) => array.shape().to_vec(),
        _ => Vec::new(),
    }
}

fn flatten<'a>(value: &'a Value, shape: &[usize], out: &mut Vec<Leaf<'a>>) -> Result<(), ArrayError> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            let Some((&len, rest)) = shape.split_first() else {
                return Err(ArrayError::Ragged);
            };
            if items.len() != len {
                return Err(ArrayError::Ragged);
            }
            items.iter().try_for_each(|item| flatten(item, rest, out))
        }
        Value::Array(array) => {
            if array.shape() != shape {
                return Err(ArrayError::Ragged);
            }
            push_array_leaves(array, out);
            Ok(())
        }
        other if shape.is_empty() => {
            out.push(Leaf::from_value(other));
            Ok(())
        }
        _ => Err(ArrayError::Ragged),
    }
}

#[derive(Default)]
struct Promotion {
    all_bool: bool,
    all_str: bool,
    any_str: bool,
    any_other: bool,
    any_float: bool,
    any_complex: bool,
    any_negative: bool,
    any_big_uint: bool,
    max_chars: usize,
}

impl Promotion {
    fn scan(leaves: &[Leaf<'_>]) -> Self {
        let mut p = Promotion {
            all_bool: true,
            all_str: true,
            ..Default::default()
        };
        for leaf in leaves {
            p.all_bool &= matches!(leaf, Leaf::Bool(_));
            p.all_str &= matches!(leaf, Leaf::Str(_));
            match leaf {
                Leaf::Str(s) => {
                    p.any_str = true;
                    p.max_chars = p.max_chars.max(s.chars().count());
                }
                Leaf::Other(_) => p.any_other = true,
                Leaf::Float(_) => p.any_float = true,
                Leaf::Complex(_) => p.any_complex = true,
                Leaf::Int(i) if *i < 0 => p.any_negative = true,
                Leaf::UInt(u) if *u > i64::MAX as u64 => p.any_big_uint = true,
                _ => {}
            }
        }
        p
    }
}

impl NdArray {
    /// Builds a homogeneous array from a nested sequence.
    ///
    /// Nested lists, tuples and arrays add dimensions and must agree in
    /// shape at every level, otherwise [`ArrayError::Ragged`] is returned.
    /// The element kind is promoted across all leaves: bool, then int64,
    /// uint64, float64 and complex128; all-string input gives a unicode
    /// array and anything else an object array. An empty sequence gives an
    /// empty float64 array.
    pub fn from_sequence(items: &[Value]) -> Result<NdArray, ArrayError> {
        let mut shape = vec![items.len()];
        if let Some(first) = items.first() {
            shape.extend(probe_shape(first));
        }
        let mut leaves = Vec::with_capacity(shape.iter().product());
        items
            .iter()
            .try_for_each(|item| flatten(item, &shape[1..], &mut leaves))?;

        let p = Promotion::scan(&leaves);
        let (dtype, data) = if leaves.is_empty() {
            (DType::float(8), ArrayData::Float(Vec::new()))
        } else if p.any_other || (p.any_str && !p.all_str) {
            let values = leaves.into_iter().map(Leaf::into_value).collect();
            (DType::object(), ArrayData::Object(values))
        } else if p.all_str {
            let values = leaves.into_iter().map(Leaf::into_value).filter_map(|v| match v {
                Value::Str(s) => Some(s),
                _ => None,
            });
            (DType::unicode(p.max_chars.max(1)), ArrayData::Unicode(values.collect()))
        } else if p.all_bool {
            let values = leaves.iter().map(|l| matches!(l, Leaf::Bool(true))).collect();
            (DType::bool(), ArrayData::Bool(values))
        } else if p.any_complex {
            let values = leaves.iter().map(Leaf::as_complex).collect();
            (DType::complex(16), ArrayData::Complex(values))
        } else if p.any_float || (p.any_big_uint && p.any_negative) {
            let values = leaves.iter().map(Leaf::as_f64).collect();
            (DType::float(8), ArrayData::Float(values))
        } else if p.any_big_uint {
            let values = leaves
                .iter()
                .map(|l| match l {
                    Leaf::UInt(u) => *u,
                    Leaf::Int(i) => *i as u64,
                    Leaf::Bool(b) => u64::from(*b),
                    _ => 0,
                })
                .collect();
            (DType::uint(8), ArrayData::UInt(values))
        } else {
            let values = leaves
                .iter()
                .map(|l| match l {
                    Leaf::Int(i) => *i,
                    Leaf::UInt(u) => *u as i64,
                    Leaf::Bool(b) => i64::from(*b),
                    _ => 0,
                })
                .collect();
            (DType::int(8), ArrayData::Int(values))
        };
        NdArray::new(dtype, shape, data)
    }
}
