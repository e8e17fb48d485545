//! Package authoring: manifest I/O and package/resource scaffolding
//!
//! Writes are whole-file and sequential; the design assumes a single writer
//! per package at a time. Every properties write is checked against the
//! standard plus the Sprout rules first, so nothing invalid ever lands in a
//! `datapackage.json`.

use crate::checks::{check_properties, check_resource_properties, CheckErrors};
use crate::data::{write_parquet, DataIoError, MergeError};
use crate::paths::{
    batch_file_name, extract_resource_id, next_id, resource_path_string, LayoutError, PackagePath,
};
use crate::properties::{PackageProperties, Properties, PropertiesError, ResourceProperties};
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Error during manifest I/O or package/resource authoring.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{path}' is not valid JSON: {source}")]
    ParseManifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("package {package_id} has no resource with id {resource_id}")]
    UnknownResource { package_id: u64, resource_id: u64 },

    #[error(transparent)]
    Properties(#[from] PropertiesError),

    #[error(transparent)]
    Check(#[from] CheckErrors),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Data(#[from] DataIoError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Read a `datapackage.json` manifest into the typed properties record.
pub fn read_package_properties(path: &Path) -> Result<PackageProperties, PackageError> {
    let content = fs::read_to_string(path).map_err(|source| PackageError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| PackageError::ParseManifest {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(PackageProperties::from_value(value)?)
}

/// Check and write a manifest: the compact-serialized properties as UTF-8,
/// pretty-printed JSON with 2-space indentation and a trailing newline.
pub fn write_package_properties(
    path: &Path,
    properties: &PackageProperties,
) -> Result<(), PackageError> {
    let value = properties.to_value()?;
    check_properties(&value, true)?;

    let mut content =
        serde_json::to_string_pretty(&value).map_err(PropertiesError::Serialize)?;
    content.push('\n');
    fs::write(path, content).map_err(|source| PackageError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote package manifest");
    Ok(())
}

/// Create a new package: check the properties, assign the next package id,
/// create the directory skeleton, and write `datapackage.json` plus a
/// templated `README.md`. Returns the assigned id.
pub fn create_package(
    paths: &PackagePath,
    mut properties: PackageProperties,
) -> Result<u64, PackageError> {
    properties.fill_defaults();

    let package_id = next_id(&paths.packages())?;
    create_dir(&paths.resources(package_id))?;
    write_package_properties(&paths.properties(package_id), &properties)?;
    write_file(&paths.readme(package_id), render_readme(&properties))?;

    info!(package_id, "created package");
    Ok(package_id)
}

/// Add a resource to an existing package: assign the next resource id, set
/// the canonical path on the resource properties, check them, create the
/// resource and batch directories, and rewrite the manifest. Returns the
/// assigned id.
pub fn create_resource(
    paths: &PackagePath,
    package_id: u64,
    mut resource: ResourceProperties,
) -> Result<u64, PackageError> {
    let mut properties = read_package_properties(&paths.properties(package_id))?;

    let resource_id = next_id(&paths.resources(package_id))?;
    resource.path = Some(resource_path_string(resource_id));
    if resource.resource_type.is_none() {
        resource.resource_type = Some(crate::properties::RESOURCE_TYPE_TABLE.to_string());
    }
    check_resource_properties(&resource.to_value()?, true)?;

    create_dir(&paths.resource_batch(package_id, resource_id))?;
    properties.resources.push(resource);
    write_package_properties(&paths.properties(package_id), &properties)?;

    info!(package_id, resource_id, "created resource");
    Ok(resource_id)
}

/// Merge edited envelope properties into an existing manifest: the updated
/// envelope replaces the stored one, resources are preserved as they are,
/// and the merged record is checked before being rewritten.
pub fn update_package_properties(
    paths: &PackagePath,
    package_id: u64,
    mut updates: PackageProperties,
) -> Result<PackageProperties, PackageError> {
    let current = read_package_properties(&paths.properties(package_id))?;
    updates.fill_defaults();
    updates.resources = current.resources;
    write_package_properties(&paths.properties(package_id), &updates)?;
    Ok(updates)
}

/// Write an uploaded table as a new timestamped batch file for a resource.
/// Returns the created file's path.
pub fn write_batch(
    paths: &PackagePath,
    package_id: u64,
    resource_id: u64,
    data: &mut DataFrame,
) -> Result<PathBuf, PackageError> {
    let batch_dir = paths.resource_batch(package_id, resource_id);
    create_dir(&batch_dir)?;
    let path = batch_dir.join(batch_file_name(chrono::Utc::now()));
    write_parquet(data, &path)?;
    info!(package_id, resource_id, path = %path.display(), "wrote batch file");
    Ok(path)
}

/// Merge every batch of one resource into its canonical data file, using
/// the schema stored in the package manifest.
pub fn merge_resource(
    paths: &PackagePath,
    package_id: u64,
    resource_id: u64,
) -> Result<DataFrame, PackageError> {
    let properties = read_package_properties(&paths.properties(package_id))?;
    let resource = properties
        .resources
        .iter()
        .find(|resource| {
            resource
                .path
                .as_deref()
                .and_then(extract_resource_id)
                .is_some_and(|id| id == resource_id)
        })
        .ok_or(PackageError::UnknownResource {
            package_id,
            resource_id,
        })?;

    let merged = crate::data::merge_batch_directory(
        &paths.resource_batch(package_id, resource_id),
        resource,
        &paths.resource_data(package_id, resource_id),
    )?;
    Ok(merged)
}

fn render_readme(properties: &PackageProperties) -> String {
    format!(
        "# {}\n\n{}\n\nThis data package is managed by Sprout. The `datapackage.json` manifest\n\
         describes every resource; each resource's canonical data lives at\n\
         `resources/<id>/data.parquet` and is rebuilt from the raw batch files\n\
         under `resources/<id>/batch/`.\n",
        properties.title.as_deref().unwrap_or("Data package"),
        properties.description.as_deref().unwrap_or_default(),
    )
}

fn create_dir(path: &Path) -> Result<(), PackageError> {
    fs::create_dir_all(path).map_err(|source| PackageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: String) -> Result<(), PackageError> {
    fs::write(path, content).map_err(|source| PackageError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}
