//! Value normalization: rewrites a dynamic [`Value`] graph into the
//! [`MatValue`] shapes the MAT format can hold.
//!
//! Dispatch, first match wins:
//!
//! 1. `Dict` becomes a struct with every value normalized.
//! 2. `None` becomes NaN.
//! 3. `List` becomes a numeric array when it builds into one with an
//!    unsigned, signed, float or complex element kind; otherwise it is
//!    handled as a tuple with `convert_to_float` cleared.
//! 4. `Tuple`/`Set` normalize every element; a single element is returned
//!    as is, anything else becomes a cell array. Elements that are arrays
//!    or cells of one common shape are stacked along a new leading axis.
//! 5. `Array` goes through [`clean_array`].
//! 6. Scalars and strings become their single-element MAT value.

mod clean;

pub use clean::clean_array;

use thiserror::Error;
use tracing::debug;

use crate::array::{ArrayData, ArrayError, DType, NdArray};
use crate::mat_value::{CellArray, MatValue};
use crate::Value;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Datatype not supported: {0}")]
    UnsupportedDatatype(DType),
    #[error(transparent)]
    Array(#[from] ArrayError),
}

/// Normalizes `value`, leaving it untouched.
///
/// With `convert_to_float` set, integer and boolean arrays are widened to
/// float64 during cleanup. The flag is carried into dict values, tuples and
/// sets, but a list that is not numeric rebuilds its elements without it.
pub fn normalize(value: &Value, convert_to_float: bool) -> Result<MatValue, NormalizeError> {
    match value {
        Value::Dict(entries) => entries
            .iter()
            .map(|(key, v)| Ok((key.clone(), normalize(v, convert_to_float)?)))
            .collect::<Result<Vec<_>, NormalizeError>>()
            .map(MatValue::Struct),
        Value::None => Ok(MatValue::scalar_f64(f64::NAN)),
        Value::List(items) => match NdArray::from_sequence(items) {
            Ok(array) if array.dtype().kind().is_numeric() => clean_array(array, convert_to_float),
            Ok(array) => {
                debug!(dtype = %array.dtype(), len = items.len(), "non-numeric list, building cell");
                normalize_cells(items, false)
            }
            Err(err) => {
                debug!(error = %err, len = items.len(), "list is not an array, building cell");
                normalize_cells(items, false)
            }
        },
        Value::Tuple(items) | Value::Set(items) => normalize_cells(items, convert_to_float),
        Value::Array(array) => clean_array(array.clone(), convert_to_float),
        Value::Bool(b) => Ok(single(DType::bool(), ArrayData::Bool(vec![*b]))),
        Value::Int(i) => Ok(single(DType::int(8), ArrayData::Int(vec![*i]))),
        Value::UInt(u) => Ok(single(DType::uint(8), ArrayData::UInt(vec![*u]))),
        Value::Float(f) => Ok(MatValue::scalar_f64(*f)),
        Value::Complex(c) => Ok(single(DType::complex(16), ArrayData::Complex(vec![*c]))),
        Value::Str(s) => Ok(MatValue::Char(s.clone())),
        Value::Bytes(b) => Ok(MatValue::Char(b.iter().map(|&byte| char::from(byte)).collect())),
    }
}

fn single(dtype: DType, data: ArrayData) -> MatValue {
    MatValue::Array(NdArray::single(dtype, data))
}

/// Normalizes each element; one element collapses to itself, anything else
/// is wrapped in a cell array.
fn normalize_cells(items: &[Value], convert_to_float: bool) -> Result<MatValue, NormalizeError> {
    let mut cells = items
        .iter()
        .map(|item| normalize(item, convert_to_float))
        .collect::<Result<Vec<_>, _>>()?;
    if cells.len() == 1 {
        return Ok(cells.swap_remove(0));
    }
    let cell = match common_shape(&cells) {
        Some(shape) => stack(cells, shape)?,
        None => CellArray::from_vec(cells),
    };
    Ok(MatValue::Cell(if cell.ndim() > 1 {
        cell.transpose()
    } else {
        cell
    }))
}

/// Shape shared by every element, when all of them are arrays or cells with
/// at least one dimension.
fn common_shape(cells: &[MatValue]) -> Option<Vec<usize>> {
    fn shape_of(value: &MatValue) -> Option<&[usize]> {
        match value {
            MatValue::Array(array) if array.ndim() > 0 => Some(array.shape()),
            MatValue::Cell(cell) if cell.ndim() > 0 => Some(cell.shape()),
            _ => None,
        }
    }
    let (first, rest) = cells.split_first()?;
    let shape = shape_of(first)?;
    rest.iter()
        .all(|cell| shape_of(cell) == Some(shape))
        .then(|| shape.to_vec())
}

/// Stacks equal-shape elements into a cell of shape `[n, ..shape]`. Array
/// elements are split into scalars, cell elements give up their contents.
fn stack(cells: Vec<MatValue>, shape: Vec<usize>) -> Result<CellArray, NormalizeError> {
    let stacked = [vec![cells.len()], shape].concat();
    let mut leaves = Vec::with_capacity(stacked.iter().product());
    for value in cells {
        match value {
            MatValue::Array(array) => {
                leaves.extend(array.elements().into_iter().map(MatValue::Array))
            }
            MatValue::Cell(cell) => leaves.extend(cell.into_cells()),
            other => leaves.push(other),
        }
    }
    debug!(shape = ?stacked, "stacking equal-shape elements into a cell");
    let count = leaves.len();
    let expected = stacked.iter().product();
    match CellArray::with_shape(stacked.clone(), leaves) {
        Some(cell) => Ok(cell),
        None => Err(ArrayError::ShapeMismatch {
            shape: stacked,
            expected,
            actual: count,
        }
        .into()),
    }
}
