//! Merging timestamped batch files into a resource's canonical file
//!
//! One merge is a sequential pipeline per resource: collect batches, tag
//! each row set with its batch timestamp, concatenate, deduplicate on the
//! resource's primary key (or full-row identity) keeping the most recent
//! batch's row, re-validate against the schema, and fully overwrite the
//! canonical data file. A corrected later batch silently supersedes an
//! earlier mistake while the older batch file stays on disk untouched.

use super::check::{check_data, DataCheckErrors};
use super::io::{read_parquet, write_parquet, DataIoError};
use crate::paths::{find_batch_timestamp, parse_batch_timestamp};
use crate::properties::ResourceProperties;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Internal column carrying each row's batch timestamp during a merge.
/// Never written out; the compact timestamp format sorts lexicographically
/// in chronological order.
pub const BATCH_TIMESTAMP_COLUMN: &str = "__sprout_batch_timestamp";

/// Error during a batch merge. Any failure aborts the whole merge; no rows
/// are committed.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no batch files to merge")]
    NoBatches,

    #[error("failed to list batch directory '{path}': {source}")]
    ListBatches {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("batch file '{file}' has no timestamp in its name")]
    MissingTimestamp { file: String },

    #[error("batch file '{file}' has an invalid timestamp '{timestamp}': {source}")]
    InvalidTimestamp {
        file: String,
        timestamp: String,
        source: chrono::ParseError,
    },

    #[error(
        "batch file '{file}' does not match the first batch's shape: \
         expected [{expected}], found [{actual}]"
    )]
    ShapeMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("batch column '{0}' collides with the internal timestamp column")]
    ReservedColumn(String),

    #[error(
        "{groups} key group(s) have rows from the same batch timestamp with \
         differing values; a later batch must supersede, not contradict"
    )]
    AmbiguousKeys { groups: usize },

    #[error(transparent)]
    Io(#[from] DataIoError),

    #[error(transparent)]
    Data(#[from] DataCheckErrors),

    #[error("data frame operation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// One batch file read into memory, tagged with the timestamp parsed from
/// its file name. Ephemeral; exists only while a merge runs.
struct BatchRows {
    data: DataFrame,
    timestamp: String,
}

/// Merge the given batch files and commit the result to the resource's
/// canonical data file, fully overwriting it. Returns the committed table.
pub fn merge_batches(
    batch_paths: &[PathBuf],
    resource: &ResourceProperties,
    canonical_path: &Path,
) -> Result<DataFrame, MergeError> {
    if batch_paths.is_empty() {
        return Err(MergeError::NoBatches);
    }

    let mut batches = Vec::with_capacity(batch_paths.len());
    for path in batch_paths {
        batches.push(read_batch(path)?);
    }
    check_batch_shapes(batch_paths, &batches)?;

    let merged = concatenate_tagged(batches)?;
    let mut deduplicated = deduplicate(merged, resource)?;

    let schema = resource.schema.clone().unwrap_or_default();
    check_data(&deduplicated, &schema)?;

    write_parquet(&mut deduplicated, canonical_path)?;
    info!(
        rows = deduplicated.height(),
        path = %canonical_path.display(),
        "committed merged resource data"
    );
    Ok(deduplicated)
}

/// Merge every batch file found in a resource's batch directory,
/// lexicographic file-name order (equal to chronological order for the
/// compact timestamp prefix).
pub fn merge_batch_directory(
    batch_dir: &Path,
    resource: &ResourceProperties,
    canonical_path: &Path,
) -> Result<DataFrame, MergeError> {
    let entries = std::fs::read_dir(batch_dir).map_err(|source| MergeError::ListBatches {
        path: batch_dir.to_path_buf(),
        source,
    })?;

    let mut batch_paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| MergeError::ListBatches {
            path: batch_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("parquet") {
            batch_paths.push(path);
        }
    }
    batch_paths.sort();
    merge_batches(&batch_paths, resource, canonical_path)
}

/// Read one batch file and extract its timestamp: the first
/// timestamp-shaped substring of the file name, which must also be a valid
/// calendar instant.
fn read_batch(path: &Path) -> Result<BatchRows, MergeError> {
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    let timestamp = find_batch_timestamp(&file)
        .ok_or_else(|| MergeError::MissingTimestamp { file: file.clone() })?
        .to_string();
    parse_batch_timestamp(&timestamp).map_err(|source| MergeError::InvalidTimestamp {
        file: file.clone(),
        timestamp: timestamp.clone(),
        source,
    })?;

    let data = read_parquet(path)?;
    debug!(file, rows = data.height(), "collected batch");
    Ok(BatchRows { data, timestamp })
}

/// Every batch must have the first batch's column names and physical types;
/// a mismatch fails the merge before any row is kept.
fn check_batch_shapes(paths: &[PathBuf], batches: &[BatchRows]) -> Result<(), MergeError> {
    let describe = |data: &DataFrame| -> String {
        data.schema()
            .iter()
            .map(|(name, dtype)| format!("{name}: {dtype}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let expected = describe(&batches[0].data);
    for (path, batch) in paths.iter().zip(batches).skip(1) {
        let actual = describe(&batch.data);
        if actual != expected {
            return Err(MergeError::ShapeMismatch {
                file: path.display().to_string(),
                expected,
                actual,
            });
        }
    }
    Ok(())
}

/// Tag each batch with its timestamp and stack them into one table.
fn concatenate_tagged(batches: Vec<BatchRows>) -> Result<DataFrame, MergeError> {
    let mut merged: Option<DataFrame> = None;
    for batch in batches {
        let mut data = batch.data;
        if data
            .get_column_names_str()
            .contains(&BATCH_TIMESTAMP_COLUMN)
        {
            return Err(MergeError::ReservedColumn(BATCH_TIMESTAMP_COLUMN.to_string()));
        }
        let tags = vec![batch.timestamp; data.height()];
        data.with_column(Series::new(BATCH_TIMESTAMP_COLUMN.into(), tags))?;

        match merged.as_mut() {
            None => merged = Some(data),
            Some(accumulated) => {
                accumulated.vstack_mut(&data)?;
            }
        }
    }
    // batches were checked to be non-empty by the caller
    merged.ok_or(MergeError::NoBatches)
}

/// Deduplicate on the resource's primary key, or full-row identity when no
/// key is declared: sort by batch timestamp ascending and keep the last
/// (most recent) row per key. Rows that share a key and a timestamp but
/// disagree on values are a reported logic error, never resolved by
/// concatenation order.
fn deduplicate(merged: DataFrame, resource: &ResourceProperties) -> Result<DataFrame, MergeError> {
    // exact duplicate rows (same key, same timestamp, same values) are
    // legitimate re-ingests and collapse to one
    let merged = merged.unique_stable(None, UniqueKeepStrategy::First, None)?;

    let key_columns: Vec<String> = match resource.primary_key() {
        Some(key) => key.names().iter().map(ToString::to_string).collect(),
        None => merged
            .get_column_names_str()
            .iter()
            .filter(|&&name| name != BATCH_TIMESTAMP_COLUMN)
            .map(ToString::to_string)
            .collect(),
    };

    let mut group_columns = key_columns.clone();
    group_columns.push(BATCH_TIMESTAMP_COLUMN.to_string());
    let ambiguous = merged
        .clone()
        .lazy()
        .group_by(group_columns.iter().map(col).collect::<Vec<_>>())
        .agg([len().alias("__group_size")])
        .filter(col("__group_size").gt(lit(1u32)))
        .collect()?;
    if ambiguous.height() > 0 {
        return Err(MergeError::AmbiguousKeys {
            groups: ambiguous.height(),
        });
    }

    let sorted = merged.sort(
        [BATCH_TIMESTAMP_COLUMN],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;
    let deduplicated =
        sorted.unique_stable(Some(key_columns.as_slice()), UniqueKeepStrategy::Last, None)?;
    Ok(deduplicated.drop(BATCH_TIMESTAMP_COLUMN)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::batch_file_name;
    use crate::properties::{FieldProperties, FieldType, TableSchemaProperties};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn resource_with_key(key: &[&str]) -> ResourceProperties {
        let mut resource = ResourceProperties::new("r");
        resource.schema = Some(TableSchemaProperties {
            fields: vec![
                FieldProperties::new("id", FieldType::Integer),
                FieldProperties::new("v", FieldType::String),
            ],
            primary_key: if key.is_empty() {
                None
            } else if key.len() == 1 {
                Some(key[0].into())
            } else {
                Some(key.iter().map(ToString::to_string).collect::<Vec<_>>().into())
            },
            ..Default::default()
        });
        resource
    }

    fn write_batch_file(dir: &Path, hour: u32, data: &mut DataFrame) -> PathBuf {
        let at = Utc.with_ymd_and_hms(2024, 5, 14, hour, 0, 0).unwrap();
        let path = dir.join(batch_file_name(at));
        write_parquet(data, &path).unwrap();
        path
    }

    #[test]
    fn newest_batch_wins_per_key() {
        let temp = TempDir::new().unwrap();
        let older = write_batch_file(temp.path(), 1, &mut df!("id" => [1i64], "v" => ["a"]).unwrap());
        let newer = write_batch_file(temp.path(), 2, &mut df!("id" => [1i64], "v" => ["b"]).unwrap());
        let canonical = temp.path().join("data.parquet");

        let merged = merge_batches(
            &[older, newer],
            &resource_with_key(&["id"]),
            &canonical,
        )
        .unwrap();

        assert!(merged.equals(&df!("id" => [1i64], "v" => ["b"]).unwrap()));
        assert!(read_parquet(&canonical).unwrap().equals(&merged));
    }

    #[test]
    fn composite_key_keeps_one_row_per_distinct_tuple() {
        let temp = TempDir::new().unwrap();
        let first = write_batch_file(
            temp.path(),
            1,
            &mut df!(
                "id" => [1i64, 1, 2],
                "v" => ["a", "b", "c"]
            )
            .unwrap(),
        );
        // overlaps (1, "a") with a newer value and adds (3, "d")
        let second = write_batch_file(
            temp.path(),
            2,
            &mut df!(
                "id" => [1i64, 3],
                "v" => ["a", "d"]
            )
            .unwrap(),
        );
        let canonical = temp.path().join("data.parquet");

        let mut resource = resource_with_key(&[]);
        resource.schema.as_mut().unwrap().primary_key = Some(
            vec!["id".to_string(), "v".to_string()].into(),
        );
        let merged = merge_batches(&[first, second], &resource, &canonical).unwrap();

        // distinct (id, v) tuples: (1,a) (1,b) (2,c) (3,d)
        assert_eq!(merged.height(), 4);
    }

    #[test]
    fn without_primary_key_full_rows_deduplicate() {
        let temp = TempDir::new().unwrap();
        let first =
            write_batch_file(temp.path(), 1, &mut df!("id" => [1i64, 2], "v" => ["a", "b"]).unwrap());
        let second =
            write_batch_file(temp.path(), 2, &mut df!("id" => [1i64], "v" => ["a"]).unwrap());
        let canonical = temp.path().join("data.parquet");

        let merged = merge_batches(&[first, second], &resource_with_key(&[]), &canonical).unwrap();
        assert_eq!(merged.height(), 2);
    }

    #[test]
    fn file_without_timestamp_fails_the_merge() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notimestamp.parquet");
        write_parquet(&mut df!("id" => [1i64], "v" => ["a"]).unwrap(), &path).unwrap();

        let result = merge_batches(
            &[path],
            &resource_with_key(&["id"]),
            &temp.path().join("data.parquet"),
        );
        assert!(matches!(result, Err(MergeError::MissingTimestamp { .. })));
    }

    #[test]
    fn calendar_invalid_timestamp_fails_the_merge() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("20241301T000000Z-x.parquet");
        write_parquet(&mut df!("id" => [1i64], "v" => ["a"]).unwrap(), &path).unwrap();

        let result = merge_batches(
            &[path],
            &resource_with_key(&["id"]),
            &temp.path().join("data.parquet"),
        );
        assert!(matches!(result, Err(MergeError::InvalidTimestamp { .. })));
    }

    #[test]
    fn mismatched_batch_shapes_fail_before_any_row_is_kept() {
        let temp = TempDir::new().unwrap();
        let first =
            write_batch_file(temp.path(), 1, &mut df!("id" => [1i64], "v" => ["a"]).unwrap());
        let second =
            write_batch_file(temp.path(), 2, &mut df!("id" => ["1"], "v" => ["a"]).unwrap());
        let canonical = temp.path().join("data.parquet");

        let result = merge_batches(&[first, second], &resource_with_key(&["id"]), &canonical);
        assert!(matches!(result, Err(MergeError::ShapeMismatch { .. })));
        assert!(!canonical.exists());
    }

    #[test]
    fn same_key_same_timestamp_different_values_is_ambiguous() {
        let temp = TempDir::new().unwrap();
        let batch = write_batch_file(
            temp.path(),
            1,
            &mut df!("id" => [1i64, 1], "v" => ["a", "b"]).unwrap(),
        );

        let result = merge_batches(
            &[batch],
            &resource_with_key(&["id"]),
            &temp.path().join("data.parquet"),
        );
        assert!(matches!(result, Err(MergeError::AmbiguousKeys { groups: 1 })));
    }

    #[test]
    fn merged_data_is_revalidated_before_commit() {
        let temp = TempDir::new().unwrap();
        // column 'id' is a string, but the schema declares integer
        let batch =
            write_batch_file(temp.path(), 1, &mut df!("id" => ["x"], "v" => ["a"]).unwrap());
        let canonical = temp.path().join("data.parquet");

        let result = merge_batches(&[batch], &resource_with_key(&["id"]), &canonical);
        assert!(matches!(result, Err(MergeError::Data(_))));
        assert!(!canonical.exists());
    }

    #[test]
    fn directory_merge_picks_up_every_parquet_batch() {
        let temp = TempDir::new().unwrap();
        let batch_dir = temp.path().join("batch");
        std::fs::create_dir(&batch_dir).unwrap();
        write_batch_file(&batch_dir, 1, &mut df!("id" => [1i64], "v" => ["a"]).unwrap());
        write_batch_file(&batch_dir, 2, &mut df!("id" => [2i64], "v" => ["b"]).unwrap());
        std::fs::write(batch_dir.join("notes.txt"), b"ignored").unwrap();

        let canonical = temp.path().join("data.parquet");
        let merged =
            merge_batch_directory(&batch_dir, &resource_with_key(&["id"]), &canonical).unwrap();
        assert_eq!(merged.height(), 2);
    }

    #[test]
    fn commit_fully_overwrites_the_canonical_file() {
        let temp = TempDir::new().unwrap();
        let canonical = temp.path().join("data.parquet");
        write_parquet(
            &mut df!("id" => [7i64, 8, 9], "v" => ["x", "y", "z"]).unwrap(),
            &canonical,
        )
        .unwrap();

        let batch =
            write_batch_file(temp.path(), 1, &mut df!("id" => [1i64], "v" => ["a"]).unwrap());
        merge_batches(&[batch], &resource_with_key(&["id"]), &canonical).unwrap();

        let back = read_parquet(&canonical).unwrap();
        assert_eq!(back.height(), 1);
    }
}
