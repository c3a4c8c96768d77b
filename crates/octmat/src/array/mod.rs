//! Typed, shaped arrays: the numpy-like side of the value model.

mod build;
pub mod dtype;

pub use dtype::{ByteOrder, DType, DTypeKind, TimeUnit};
pub use num_complex::Complex64;

use thiserror::Error;

use crate::Value;

/// Error raised while building or casting an [`NdArray`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArrayError {
    #[error("inhomogeneous shape: nested sequences differ in length or depth")]
    Ragged,
    #[error("shape {shape:?} needs {expected} elements, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
    #[error("element storage does not match dtype {0}")]
    StorageMismatch(DType),
    #[error("record row has {actual} values for {expected} fields")]
    RecordWidth { expected: usize, actual: usize },
    #[error("cannot cast array from {from} to {to}")]
    UnsupportedCast { from: DType, to: DType },
}

/// Element storage. Values are kept widened; the [`DType`] records the
/// declared width.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Float(Vec<f64>),
    Complex(Vec<Complex64>),
    DateTime(Vec<i64>),
    TimeDelta(Vec<i64>),
    Bytes(Vec<Vec<u8>>),
    Unicode(Vec<String>),
    /// Opaque records: named fields, one row of values per element.
    Record {
        fields: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    /// Generic references.
    Object(Vec<Value>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bool(v) => v.len(),
            ArrayData::Int(v) | ArrayData::DateTime(v) | ArrayData::TimeDelta(v) => v.len(),
            ArrayData::UInt(v) => v.len(),
            ArrayData::Float(v) => v.len(),
            ArrayData::Complex(v) => v.len(),
            ArrayData::Bytes(v) => v.len(),
            ArrayData::Unicode(v) => v.len(),
            ArrayData::Record { rows, .. } => rows.len(),
            ArrayData::Object(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> DTypeKind {
        match self {
            ArrayData::Bool(_) => DTypeKind::Bool,
            ArrayData::Int(_) => DTypeKind::Int,
            ArrayData::UInt(_) => DTypeKind::UInt,
            ArrayData::Float(_) => DTypeKind::Float,
            ArrayData::Complex(_) => DTypeKind::Complex,
            ArrayData::DateTime(_) => DTypeKind::DateTime,
            ArrayData::TimeDelta(_) => DTypeKind::TimeDelta,
            ArrayData::Bytes(_) => DTypeKind::Bytes,
            ArrayData::Unicode(_) => DTypeKind::Unicode,
            ArrayData::Record { .. } => DTypeKind::Void,
            ArrayData::Object(_) => DTypeKind::Object,
        }
    }

    /// Storage holding only element `i`.
    fn at(&self, i: usize) -> Self {
        match self {
            ArrayData::Bool(v) => ArrayData::Bool(vec![v[i]]),
            ArrayData::Int(v) => ArrayData::Int(vec![v[i]]),
            ArrayData::UInt(v) => ArrayData::UInt(vec![v[i]]),
            ArrayData::Float(v) => ArrayData::Float(vec![v[i]]),
            ArrayData::Complex(v) => ArrayData::Complex(vec![v[i]]),
            ArrayData::DateTime(v) => ArrayData::DateTime(vec![v[i]]),
            ArrayData::TimeDelta(v) => ArrayData::TimeDelta(vec![v[i]]),
            ArrayData::Bytes(v) => ArrayData::Bytes(vec![v[i].clone()]),
            ArrayData::Unicode(v) => ArrayData::Unicode(vec![v[i].clone()]),
            ArrayData::Record { fields, rows } => ArrayData::Record {
                fields: fields.clone(),
                rows: vec![rows[i].clone()],
            },
            ArrayData::Object(v) => ArrayData::Object(vec![v[i].clone()]),
        }
    }

    /// Rearranges elements so that position `k` holds the old element `order[k]`.
    fn reorder(self, order: &[usize]) -> Self {
        fn pick<T: Clone>(v: Vec<T>, order: &[usize]) -> Vec<T> {
            order.iter().map(|&i| v[i].clone()).collect()
        }
        match self {
            ArrayData::Bool(v) => ArrayData::Bool(pick(v, order)),
            ArrayData::Int(v) => ArrayData::Int(pick(v, order)),
            ArrayData::UInt(v) => ArrayData::UInt(pick(v, order)),
            ArrayData::Float(v) => ArrayData::Float(pick(v, order)),
            ArrayData::Complex(v) => ArrayData::Complex(pick(v, order)),
            ArrayData::DateTime(v) => ArrayData::DateTime(pick(v, order)),
            ArrayData::TimeDelta(v) => ArrayData::TimeDelta(pick(v, order)),
            ArrayData::Bytes(v) => ArrayData::Bytes(pick(v, order)),
            ArrayData::Unicode(v) => ArrayData::Unicode(pick(v, order)),
            ArrayData::Record { fields, rows } => ArrayData::Record {
                fields,
                rows: pick(rows, order),
            },
            ArrayData::Object(v) => ArrayData::Object(pick(v, order)),
        }
    }
}

/// For each element of the transposed array (row-major), the index of the
/// source element. Transposing reverses every axis, so this is also the
/// column-major traversal of an array with the given row-major `shape`.
pub fn transpose_order(shape: &[usize]) -> Vec<usize> {
    let n = shape.len();
    let total: usize = shape.iter().product();
    let mut strides = vec![1usize; n];
    for a in (0..n.saturating_sub(1)).rev() {
        strides[a] = strides[a + 1] * shape[a + 1];
    }
    let t_shape: Vec<usize> = shape.iter().rev().copied().collect();
    let t_strides: Vec<usize> = strides.iter().rev().copied().collect();

    let mut order = Vec::with_capacity(total);
    let mut idx = vec![0usize; n];
    for _ in 0..total {
        order.push(idx.iter().zip(&t_strides).map(|(j, s)| j * s).sum());
        for b in (0..n).rev() {
            idx[b] += 1;
            if idx[b] < t_shape[b] {
                break;
            }
            idx[b] = 0;
        }
    }
    order
}

fn wrap_int(v: i64, itemsize: usize) -> i64 {
    match itemsize {
        1 => v as i8 as i64,
        2 => v as i16 as i64,
        4 => v as i32 as i64,
        _ => v,
    }
}

fn wrap_uint(v: u64, itemsize: usize) -> u64 {
    match itemsize {
        1 => v as u8 as u64,
        2 => v as u16 as u64,
        4 => v as u32 as u64,
        _ => v,
    }
}

fn round_float(v: f64, itemsize: usize) -> f64 {
    if itemsize == 4 {
        v as f32 as f64
    } else {
        v
    }
}

/// A typed multidimensional array stored in row-major (C) order.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: DType,
    shape: Vec<usize>,
    data: ArrayData,
    class_name: Option<String>,
}

impl NdArray {
    /// Builds an array, checking that the storage matches the dtype kind and
    /// that the element count matches the shape.
    pub fn new(dtype: DType, shape: Vec<usize>, data: ArrayData) -> Result<Self, ArrayError> {
        if data.kind() != dtype.kind() {
            return Err(ArrayError::StorageMismatch(dtype));
        }
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(ArrayError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        if let ArrayData::Record { fields, rows } = &data {
            if let Some(row) = rows.iter().find(|row| row.len() != fields.len()) {
                return Err(ArrayError::RecordWidth {
                    expected: fields.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self {
            dtype,
            shape,
            data,
            class_name: None,
        })
    }

    /// One-dimensional float64 array.
    pub fn from_f64(values: Vec<f64>) -> Self {
        Self::vector(DType::float(8), ArrayData::Float(values))
    }

    /// One-dimensional int64 array.
    pub fn from_i64(values: Vec<i64>) -> Self {
        Self::vector(DType::int(8), ArrayData::Int(values))
    }

    /// One-dimensional uint64 array.
    pub fn from_u64(values: Vec<u64>) -> Self {
        Self::vector(DType::uint(8), ArrayData::UInt(values))
    }

    /// One-dimensional bool array.
    pub fn from_bools(values: Vec<bool>) -> Self {
        Self::vector(DType::bool(), ArrayData::Bool(values))
    }

    /// One-dimensional complex128 array.
    pub fn from_complex(values: Vec<Complex64>) -> Self {
        Self::vector(DType::complex(16), ArrayData::Complex(values))
    }

    /// One-dimensional fixed-width unicode array sized to the longest string.
    pub fn from_strings(values: Vec<String>) -> Self {
        let chars = values.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        Self::vector(DType::unicode(chars.max(1)), ArrayData::Unicode(values))
    }

    /// One-dimensional object array.
    pub fn from_objects(values: Vec<Value>) -> Self {
        Self::vector(DType::object(), ArrayData::Object(values))
    }

    fn vector(dtype: DType, data: ArrayData) -> Self {
        Self {
            dtype,
            shape: vec![data.len()],
            data,
            class_name: None,
        }
    }

    /// Zero-dimensional array holding a single element.
    pub fn scalar(dtype: DType, data: ArrayData) -> Result<Self, ArrayError> {
        Self::new(dtype, Vec::new(), data)
    }

    /// Zero-dimensional array from storage known to hold exactly one element
    /// of `dtype`'s kind.
    pub(crate) fn single(dtype: DType, data: ArrayData) -> Self {
        debug_assert_eq!(data.len(), 1);
        debug_assert_eq!(data.kind(), dtype.kind());
        Self {
            dtype,
            shape: Vec::new(),
            data,
            class_name: None,
        }
    }

    /// Returns the same elements under a new shape with the same element count.
    pub fn reshape(mut self, shape: Vec<usize>) -> Result<Self, ArrayError> {
        let expected: usize = shape.iter().product();
        if expected != self.data.len() {
            return Err(ArrayError::ShapeMismatch {
                shape,
                expected,
                actual: self.data.len(),
            });
        }
        self.shape = shape;
        Ok(self)
    }

    /// Tags a record array with the class it instantiates on the engine side.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn dtype(&self) -> &DType {
        &self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn into_parts(self) -> (DType, Vec<usize>, ArrayData, Option<String>) {
        (self.dtype, self.shape, self.data, self.class_name)
    }

    /// Splits into zero-dimensional arrays, one per element in row-major order.
    pub fn elements(&self) -> Vec<NdArray> {
        (0..self.len())
            .map(|i| Self {
                dtype: self.dtype,
                shape: Vec::new(),
                data: self.data.at(i),
                class_name: self.class_name.clone(),
            })
            .collect()
    }

    /// Reverses the order of all axes.
    pub fn transpose(self) -> Self {
        if self.ndim() < 2 {
            return self;
        }
        let order = transpose_order(&self.shape);
        let shape = self.shape.iter().rev().copied().collect();
        Self {
            dtype: self.dtype,
            shape,
            data: self.data.reorder(&order),
            class_name: self.class_name,
        }
    }

    /// Replaces every imaginary part, keeping real parts. No-op for
    /// non-complex arrays.
    pub fn set_imag(&mut self, imag: f64) {
        if let ArrayData::Complex(values) = &mut self.data {
            for c in values.iter_mut() {
                c.im = imag;
            }
        }
    }

    /// Casts to `target`.
    ///
    /// Supported: numeric and bool to int/uint/float/complex (integers wrap
    /// to the target width), datetime/timedelta to int/uint, byte and
    /// unicode strings to object.
    pub fn astype(self, target: DType) -> Result<Self, ArrayError> {
        use ArrayData as D;
        use DTypeKind as K;

        let size = target.itemsize();
        let unsupported = ArrayError::UnsupportedCast {
            from: self.dtype,
            to: target,
        };
        let data = match (self.data, target.kind()) {
            (D::Bool(v), K::Int) => D::Int(v.into_iter().map(i64::from).collect()),
            (D::Bool(v), K::UInt) => D::UInt(v.into_iter().map(u64::from).collect()),
            (D::Bool(v), K::Float) => D::Float(v.into_iter().map(|b| f64::from(u8::from(b))).collect()),
            (D::Int(v) | D::DateTime(v) | D::TimeDelta(v), K::Int) => {
                D::Int(v.into_iter().map(|x| wrap_int(x, size)).collect())
            }
            (D::Int(v) | D::DateTime(v) | D::TimeDelta(v), K::UInt) => {
                D::UInt(v.into_iter().map(|x| wrap_uint(x as u64, size)).collect())
            }
            (D::Int(v), K::Float) => {
                D::Float(v.into_iter().map(|x| round_float(x as f64, size)).collect())
            }
            (D::UInt(v), K::Int) => D::Int(v.into_iter().map(|x| wrap_int(x as i64, size)).collect()),
            (D::UInt(v), K::UInt) => D::UInt(v.into_iter().map(|x| wrap_uint(x, size)).collect()),
            (D::UInt(v), K::Float) => {
                D::Float(v.into_iter().map(|x| round_float(x as f64, size)).collect())
            }
            (D::Float(v), K::Float) => D::Float(v.into_iter().map(|x| round_float(x, size)).collect()),
            (D::Int(v), K::Complex) => {
                D::Complex(v.into_iter().map(|x| Complex64::new(x as f64, 0.0)).collect())
            }
            (D::UInt(v), K::Complex) => {
                D::Complex(v.into_iter().map(|x| Complex64::new(x as f64, 0.0)).collect())
            }
            (D::Float(v), K::Complex) => {
                D::Complex(v.into_iter().map(|x| Complex64::new(x, 0.0)).collect())
            }
            (D::Complex(v), K::Complex) => D::Complex(v),
            (D::Bytes(v), K::Object) => D::Object(v.into_iter().map(Value::Bytes).collect()),
            (D::Unicode(v), K::Object) => D::Object(v.into_iter().map(Value::Str).collect()),
            (data @ D::Object(_), K::Object) => data,
            _ => return Err(unsupported),
        };
        Ok(Self {
            dtype: target,
            shape: self.shape,
            data,
            class_name: self.class_name,
        })
    }
}
