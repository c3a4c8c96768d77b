//! Bundle writer: injects `nargin`, normalizes every variable and saves the
//! result as a MAT file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::mat5::{Mat5Encoder, Mat5Error, Mat5Options, OnedAs};
use crate::mat_value::MatValue;
use crate::normalize::{normalize, NormalizeError};
use crate::Value;

/// Key holding the positional arguments of the call.
pub const FUNC_ARGS: &str = "func_args";
/// Key injected with the number of positional arguments.
pub const NARGIN: &str = "nargin";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("bundle has no `func_args` entry")]
    MissingFuncArgs,
    #[error("`func_args` must be a list or tuple")]
    FuncArgsNotSequence,
    #[error("bundle already has a `nargin` entry")]
    ReservedKey,
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("could not save mat file {}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: Mat5Error,
    },
    #[error("could not write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub oned_as: OnedAs,
    /// Widen integer and boolean arrays to float64.
    pub convert_to_float: bool,
    pub compress: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            oned_as: OnedAs::Row,
            convert_to_float: true,
            compress: false,
        }
    }
}

impl WriteOptions {
    /// Encoder options: long field names are always on.
    pub fn mat5_options(&self) -> Mat5Options {
        Mat5Options {
            oned_as: self.oned_as,
            long_field_names: true,
            compress: self.compress,
        }
    }
}

/// Checks the bundle contract and returns its entries with `nargin`
/// appended. The bundle itself is not modified.
pub fn prepare_bundle(bundle: &Value) -> Result<Vec<(String, Value)>, WriteError> {
    let Value::Dict(entries) = bundle else {
        return Err(WriteError::MissingFuncArgs);
    };
    let nargin = match bundle.get(FUNC_ARGS) {
        Some(Value::List(args) | Value::Tuple(args)) => args.len(),
        Some(_) => return Err(WriteError::FuncArgsNotSequence),
        None => return Err(WriteError::MissingFuncArgs),
    };
    if bundle.get(NARGIN).is_some() {
        return Err(WriteError::ReservedKey);
    }
    let nargin = i64::try_from(nargin).map_err(|_| WriteError::FuncArgsNotSequence)?;

    let mut vars = entries.clone();
    vars.push((NARGIN.to_string(), Value::Int(nargin)));
    Ok(vars)
}

/// Prepares and normalizes the bundle into named MAT variables.
pub fn to_mat_vars(
    bundle: &Value,
    convert_to_float: bool,
) -> Result<Vec<(String, MatValue)>, WriteError> {
    prepare_bundle(bundle)?
        .iter()
        .map(|(name, value)| {
            debug!(name = %name, "normalizing variable");
            Ok((name.clone(), normalize(value, convert_to_float)?))
        })
        .collect()
}

/// Writes `bundle` to `path` as a MAT file, with no extension appended.
///
/// The file is encoded in memory first; nothing is left on disk when any
/// step fails.
pub fn write_file(bundle: &Value, path: &Path, options: &WriteOptions) -> Result<(), WriteError> {
    let vars = to_mat_vars(bundle, options.convert_to_float)?;
    let mut encoder = Mat5Encoder::new(options.mat5_options());
    let bytes = encoder.encode(&vars).map_err(|source| WriteError::Save {
        path: path.to_path_buf(),
        source,
    })?;

    if let Err(source) = fs::write(path, &bytes) {
        if let Err(err) = fs::remove_file(path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "could not remove partial file");
            }
        }
        return Err(WriteError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    info!(
        path = %path.display(),
        variables = vars.len(),
        bytes = bytes.len(),
        "wrote MAT file"
    );
    Ok(())
}
