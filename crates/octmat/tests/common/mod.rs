#![allow(dead_code)]

pub mod mat_reader;

use std::path::Path;

use octmat::{write_file, Value, WriteOptions};

use mat_reader::{read_mat, MatFile};

/// Writes `bundle` into a scratch directory and reads the file back.
pub fn round_trip(bundle: &Value, options: &WriteOptions) -> MatFile {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.mat");
    write_file(bundle, &path, options).unwrap();
    read_file(&path)
}

pub fn read_file(path: &Path) -> MatFile {
    let bytes = std::fs::read(path).unwrap();
    read_mat(&bytes).unwrap()
}
