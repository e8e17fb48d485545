//! Data-side validation and merging
//!
//! The in-memory table is a polars `DataFrame`; the physical on-disk format
//! is parquet, always read and rewritten whole. [`check`] validates a table
//! against a resource's schema, [`batch`] merges timestamped batch files
//! into the canonical resource file, [`types`] holds the type-mapping and
//! value-check tables both build on.

pub mod batch;
pub mod check;
pub mod io;
pub mod types;

pub use batch::{merge_batch_directory, merge_batches, MergeError, BATCH_TIMESTAMP_COLUMN};
pub use check::{check_data, DataCheckError, DataCheckErrors, ValueFailure};
pub use io::{read_parquet, write_parquet, DataIoError};
pub use types::{
    allowed_dtypes_description, dtype_is_allowed, needs_value_check, value_is_valid,
    TimezoneMode, BOOLEAN_LITERALS,
};
