//! Logic behind the `octmat-write` binary: reads a JSON bundle and writes it
//! as a MAT file.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::mat5::OnedAs;
use crate::writer::{write_file, WriteError, WriteOptions};
use crate::Value;

pub const USAGE: &str = "usage: octmat-write [--oned-as row|column] [--no-float] [--compress] <path>";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}\n{USAGE}")]
    Usage(String),
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Write(#[from] WriteError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub path: PathBuf,
    pub options: WriteOptions,
}

/// Parses the arguments that follow the program name.
pub fn parse_args<I>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut options = WriteOptions::default();
    let mut path = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--oned-as" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliError::Usage("--oned-as needs a value".to_string()))?;
                options.oned_as = value.parse::<OnedAs>().map_err(CliError::Usage)?;
            }
            "--no-float" => options.convert_to_float = false,
            "--compress" => options.compress = true,
            flag if flag.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown flag {flag}")));
            }
            _ if path.is_some() => {
                return Err(CliError::Usage(format!("unexpected argument {arg}")));
            }
            _ => path = Some(PathBuf::from(arg)),
        }
    }
    let path = path.ok_or_else(|| CliError::Usage("missing output path".to_string()))?;
    Ok(CliArgs { path, options })
}

/// Parses `json` as a bundle and writes it to `path`.
pub fn write_json(json: &str, path: &Path, options: &WriteOptions) -> Result<(), CliError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    write_file(&Value::from(value), path, options)?;
    Ok(())
}
