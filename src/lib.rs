//! Sprout SDK - authoring and validation core for tabular data packages
//!
//! Provides the engine behind a Sprout instance:
//! - Typed properties records mirroring the Data Package standard, with
//!   compact (sparse) serialization
//! - Standard-level and Sprout-level metadata checking with aggregated,
//!   deterministic error reporting
//! - Data validation of an in-memory table against a resource's schema
//!   (column parity, physical types, per-value formats)
//! - Merging of timestamped batch files into one canonical, deduplicated
//!   parquet file per resource
//! - The on-disk package layout and manifest I/O
//!
//! Everything is synchronous and single-writer: each operation is a
//! sequential transformation from inputs to a result or a fully-described
//! error, with no partial writes and no silent recovery.

pub mod checks;
pub mod data;
pub mod package;
pub mod paths;
pub mod properties;

// Re-export commonly used types
pub use checks::{
    check_package_properties, check_properties, check_resource_properties, CheckError,
    CheckErrorMatcher, CheckErrors,
};
pub use data::{
    check_data, merge_batch_directory, merge_batches, DataCheckError, DataCheckErrors,
    DataIoError, MergeError,
};
pub use package::{
    create_package, create_resource, merge_resource, read_package_properties,
    update_package_properties, write_batch, write_package_properties, PackageError,
};
pub use paths::{LayoutError, PackagePath};
pub use properties::{
    FieldProperties, FieldType, PackageProperties, Properties, PropertiesError,
    ResourceProperties, TableSchemaProperties,
};
