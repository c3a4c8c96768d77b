//! Writes dynamic, numpy-like values to MAT Level 5 files for Octave and
//! MATLAB.
//!
//! The pipeline is [`write_file`] -> [`normalize`] (with [`clean_array`] for
//! every typed array) -> [`Mat5Encoder`]:
//!
//! ```no_run
//! use octmat::{write_file, Value, WriteOptions};
//!
//! let bundle = Value::dict([
//!     ("func_args", Value::List(vec![Value::Int(1), Value::Int(2)])),
//!     ("x", Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])),
//! ]);
//! write_file(&bundle, "call.mat".as_ref(), &WriteOptions::default())?;
//! # Ok::<(), octmat::WriteError>(())
//! ```

pub mod array;
pub mod cli;
pub mod mat5;
pub mod mat_value;
pub mod normalize;
mod value;
pub mod writer;

pub use array::{ArrayData, ArrayError, ByteOrder, Complex64, DType, DTypeKind, NdArray, TimeUnit};
pub use mat5::{Mat5Encoder, Mat5Error, Mat5Options, OnedAs};
pub use mat_value::{CellArray, MatObject, MatValue};
pub use normalize::{clean_array, normalize, NormalizeError};
pub use value::Value;
pub use writer::{write_file, WriteError, WriteOptions, FUNC_ARGS, NARGIN};
