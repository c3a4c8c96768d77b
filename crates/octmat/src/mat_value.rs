//! [`MatValue`]: the normalized model the MAT encoder accepts.

use crate::array::{transpose_order, ArrayData, DType, NdArray};

/// A value restricted to shapes the MAT format can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum MatValue {
    /// Numeric or logical array.
    Array(NdArray),
    /// Char row vector.
    Char(String),
    Cell(CellArray),
    /// 1x1 struct with named fields.
    Struct(Vec<(String, MatValue)>),
    Object(MatObject),
}

impl MatValue {
    /// 1x1 double.
    pub fn scalar_f64(value: f64) -> Self {
        MatValue::Array(NdArray::single(DType::float(8), ArrayData::Float(vec![value])))
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            MatValue::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&CellArray> {
        match self {
            MatValue::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[(String, MatValue)]> {
        match self {
            MatValue::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up a field of a `Struct`.
    pub fn field(&self, name: &str) -> Option<&MatValue> {
        self.as_struct()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

/// Heterogeneous array of boxed values, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    shape: Vec<usize>,
    cells: Vec<MatValue>,
}

impl CellArray {
    /// One-dimensional cell array.
    pub fn from_vec(cells: Vec<MatValue>) -> Self {
        Self {
            shape: vec![cells.len()],
            cells,
        }
    }

    /// Cell array of the given shape; `None` when the count does not match.
    pub fn with_shape(shape: Vec<usize>, cells: Vec<MatValue>) -> Option<Self> {
        (shape.iter().product::<usize>() == cells.len()).then_some(Self { shape, cells })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[MatValue] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<MatValue> {
        self.cells
    }

    /// Reverses the order of all axes.
    pub fn transpose(self) -> Self {
        if self.ndim() < 2 {
            return self;
        }
        let order = transpose_order(&self.shape);
        let mut slots: Vec<Option<MatValue>> = self.cells.into_iter().map(Some).collect();
        let cells = order.iter().filter_map(|&i| slots[i].take()).collect();
        Self {
            shape: self.shape.into_iter().rev().collect(),
            cells,
        }
    }
}

/// Class-tagged record array, written as a MAT object.
#[derive(Debug, Clone, PartialEq)]
pub struct MatObject {
    pub class_name: String,
    pub fields: Vec<String>,
    pub shape: Vec<usize>,
    /// One row of field values per element, row-major.
    pub elements: Vec<Vec<MatValue>>,
}
