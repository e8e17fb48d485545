//! Whole-file parquet read and write
//!
//! The canonical resource file and every batch file are read and written in
//! full; no handle outlives a call and no partial write ever happens.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error reading or writing a parquet file.
#[derive(Debug, Error)]
pub enum DataIoError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read parquet from '{path}': {source}")]
    Read {
        path: PathBuf,
        source: PolarsError,
    },
    #[error("failed to write parquet to '{path}': {source}")]
    Write {
        path: PathBuf,
        source: PolarsError,
    },
}

/// Read a whole parquet file into memory.
pub fn read_parquet(path: &Path) -> Result<DataFrame, DataIoError> {
    let file = std::fs::File::open(path).map_err(|source| DataIoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetReader::new(file)
        .finish()
        .map_err(|source| DataIoError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Write a table to a parquet file, replacing any existing content.
pub fn write_parquet(data: &mut DataFrame, path: &Path) -> Result<(), DataIoError> {
    let file = std::fs::File::create(path).map_err(|source| DataIoError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(data)
        .map_err(|source| DataIoError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}
