//! MAT Level 5 encoding.
//!
//! Level 5 files start with a 128-byte header followed by one `miMATRIX`
//! data element per variable. All multi-byte values are written in
//! little-endian byte order, announced by the `IM` endian indicator.

pub mod constants;
pub mod encoder;
pub mod error;

use std::str::FromStr;

pub use encoder::Mat5Encoder;
pub use error::Mat5Error;

/// How one-dimensional arrays and cells are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnedAs {
    /// `1xN`.
    #[default]
    Row,
    /// `Nx1`.
    Column,
}

impl FromStr for OnedAs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "row" => Ok(OnedAs::Row),
            "column" => Ok(OnedAs::Column),
            other => Err(format!("expected \"row\" or \"column\", got {other:?}")),
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mat5Options {
    pub oned_as: OnedAs,
    /// Allow field names of up to 63 characters instead of 31.
    pub long_field_names: bool,
    /// Deflate each variable into an `miCOMPRESSED` element.
    pub compress: bool,
}

impl Default for Mat5Options {
    fn default() -> Self {
        Self {
            oned_as: OnedAs::Row,
            long_field_names: true,
            compress: false,
        }
    }
}

/// MAT dimensions of an array with the given row-major `shape`.
///
/// 0-d becomes `1x1`, an empty 1-d shape becomes `0x0`, other 1-d shapes
/// follow `oned_as`, and everything else is kept.
pub fn mat_dims(shape: &[usize], oned_as: OnedAs) -> Vec<usize> {
    match shape {
        [] => vec![1, 1],
        [0] => vec![0, 0],
        [n] => match oned_as {
            OnedAs::Row => vec![1, *n],
            OnedAs::Column => vec![*n, 1],
        },
        _ => shape.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_follow_orientation() {
        assert_eq!(mat_dims(&[], OnedAs::Row), vec![1, 1]);
        assert_eq!(mat_dims(&[3], OnedAs::Row), vec![1, 3]);
        assert_eq!(mat_dims(&[3], OnedAs::Column), vec![3, 1]);
        assert_eq!(mat_dims(&[0], OnedAs::Column), vec![0, 0]);
        assert_eq!(mat_dims(&[2, 3, 4], OnedAs::Column), vec![2, 3, 4]);
    }

    #[test]
    fn oned_as_from_str() {
        assert_eq!("column".parse::<OnedAs>(), Ok(OnedAs::Column));
        assert!("diagonal".parse::<OnedAs>().is_err());
    }
}
