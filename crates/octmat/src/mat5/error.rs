//! MAT5 encoder error type.

use std::io;

use thiserror::Error;

use crate::array::DType;

/// Error type for MAT5 encoding.
#[derive(Debug, Error)]
pub enum Mat5Error {
    #[error("invalid variable name: {0:?}")]
    InvalidName(String),
    #[error("field name {name:?} is longer than {max} characters")]
    FieldNameTooLong { name: String, max: usize },
    #[error("dimension {0} does not fit in a MAT file")]
    DimensionTooLarge(usize),
    #[error("data element of {0} bytes does not fit in a MAT file")]
    ElementTooLarge(usize),
    #[error("no MAT class for arrays of {0}")]
    UnsupportedArray(DType),
    #[error("object of shape {shape:?} holds {actual} elements")]
    ObjectShape { shape: Vec<usize>, actual: usize },
    #[error("object element has {actual} values for {expected} fields")]
    RecordWidth { expected: usize, actual: usize },
    #[error("compression failed")]
    Compress(#[source] io::Error),
}
