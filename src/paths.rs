//! On-disk layout of a Sprout instance
//!
//! Pure path derivation from a root directory; nothing here touches file
//! contents. The layout is:
//!
//! - Root directory
//!   - `packages/<id>/datapackage.json` - package manifest
//!   - `packages/<id>/README.md` - generated package README
//!   - `packages/<id>/resources/<id>/data.parquet` - canonical resource data
//!   - `packages/<id>/resources/<id>/batch/<timestamp>-<uuid>.parquet` -
//!     raw ingested batches, never modified after creation
//!
//! Package and resource ids are positive integers assigned as
//! `max(existing) + 1`; only directory names that are all digits count as
//! existing ids.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Compact ISO-8601 timestamp format embedded in batch file names,
/// e.g. `20240514T050903Z`.
pub const BATCH_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Shape of a batch timestamp inside a file name.
static BATCH_TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{8}T\d{6}Z").expect("batch timestamp pattern is valid"));

/// Error while deriving layout information from disk.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to list directory '{path}': {source}")]
    List {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Path builder for everything under a Sprout root directory.
///
/// # Example
///
/// ```rust
/// use sprout_sdk::paths::PackagePath;
///
/// let paths = PackagePath::new("/var/sprout");
/// assert!(paths.properties(1).ends_with("packages/1/datapackage.json"));
/// assert!(paths.resource_data(1, 2).ends_with("packages/1/resources/2/data.parquet"));
/// ```
#[derive(Debug, Clone)]
pub struct PackagePath {
    root: PathBuf,
}

impl PackagePath {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/packages`
    pub fn packages(&self) -> PathBuf {
        self.root.join("packages")
    }

    /// `<root>/packages/<id>`
    pub fn package(&self, package_id: u64) -> PathBuf {
        self.packages().join(package_id.to_string())
    }

    /// `<root>/packages/<id>/datapackage.json`
    pub fn properties(&self, package_id: u64) -> PathBuf {
        self.package(package_id).join("datapackage.json")
    }

    /// `<root>/packages/<id>/README.md`
    pub fn readme(&self, package_id: u64) -> PathBuf {
        self.package(package_id).join("README.md")
    }

    /// `<root>/packages/<id>/resources`
    pub fn resources(&self, package_id: u64) -> PathBuf {
        self.package(package_id).join("resources")
    }

    /// `<root>/packages/<id>/resources/<id>`
    pub fn resource(&self, package_id: u64, resource_id: u64) -> PathBuf {
        self.resources(package_id).join(resource_id.to_string())
    }

    /// `<root>/packages/<id>/resources/<id>/data.parquet`
    pub fn resource_data(&self, package_id: u64, resource_id: u64) -> PathBuf {
        self.resource(package_id, resource_id).join("data.parquet")
    }

    /// `<root>/packages/<id>/resources/<id>/batch`
    pub fn resource_batch(&self, package_id: u64, resource_id: u64) -> PathBuf {
        self.resource(package_id, resource_id).join("batch")
    }
}

/// Next id for a package or resource directory: `max(existing) + 1`, or 1
/// when none exist. A missing parent directory also yields 1. Only child
/// directories whose name is all digits count as existing ids.
pub fn next_id(parent: &Path) -> Result<u64, LayoutError> {
    if !parent.is_dir() {
        return Ok(1);
    }
    let entries = fs::read_dir(parent).map_err(|source| LayoutError::List {
        path: parent.to_path_buf(),
        source,
    })?;

    let mut max_id = 0u64;
    for entry in entries {
        let entry = entry.map_err(|source| LayoutError::List {
            path: parent.to_path_buf(),
            source,
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = name.parse::<u64>() {
                max_id = max_id.max(id);
            }
        }
    }
    Ok(max_id + 1)
}

/// Canonical manifest path string for a resource, relative to the package
/// directory: `resources/<id>/data.parquet`.
pub fn resource_path_string(resource_id: u64) -> String {
    format!("resources/{resource_id}/data.parquet")
}

/// Extract the resource id embedded as the middle segment of a resource
/// path string. Returns `None` when the path does not have exactly three
/// segments with an all-digit middle segment.
pub fn extract_resource_id(path: &str) -> Option<u64> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() != 3 {
        return None;
    }
    let middle = segments[1];
    if middle.is_empty() || !middle.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    middle.parse().ok()
}

/// File name for a new batch file: compact timestamp, a UUIDv4 suffix for
/// uniqueness, and the parquet extension.
pub fn batch_file_name(timestamp: DateTime<Utc>) -> String {
    format!(
        "{}-{}.parquet",
        timestamp.format(BATCH_TIMESTAMP_FORMAT),
        Uuid::new_v4()
    )
}

/// First timestamp-shaped substring of a batch file name, if any.
pub fn find_batch_timestamp(file_name: &str) -> Option<&str> {
    BATCH_TIMESTAMP_RE
        .find(file_name)
        .map(|found| found.as_str())
}

/// Parse a compact batch timestamp, rejecting syntactically well-shaped but
/// calendar-invalid values (e.g. month 13).
pub fn parse_batch_timestamp(timestamp: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(timestamp, BATCH_TIMESTAMP_FORMAT)
}
