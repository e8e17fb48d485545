//! Typed properties records mirroring the Data Package standard
//!
//! Every record is a sparse value type: unset fields are dropped on
//! serialization at every nesting level (compact serialization), and the
//! typed parse rejects unknown keys. The untyped representation used at the
//! validation boundary is a plain `serde_json::Value`; the [`Properties`]
//! trait converts between the two.

pub mod field_type;
pub mod package;
pub mod resource;
pub mod table_schema;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use field_type::FieldType;
pub use package::{
    ContributorProperties, LicenseProperties, PackageProperties, SourceProperties,
    DEFAULT_PACKAGE_VERSION,
};
pub use resource::{ResourceProperties, RESOURCE_TYPE_TABLE};
pub use table_schema::{
    ConstraintsProperties, FieldNames, FieldProperties, ForeignKeyProperties,
    ForeignKeyReference, TableSchemaProperties, DEFAULT_MISSING_VALUES,
};

/// Error converting between typed properties and their map form.
#[derive(Debug, Error)]
pub enum PropertiesError {
    #[error("failed to serialize properties: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("malformed properties structure: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Conversion between a typed properties record and its compact map form.
///
/// `from_value(to_value(p))` round-trips exactly for any record with only
/// defined fields set.
pub trait Properties: Serialize + DeserializeOwned {
    /// Compact-serialize into a JSON map, dropping unset fields recursively.
    fn to_value(&self) -> Result<serde_json::Value, PropertiesError> {
        serde_json::to_value(self).map_err(PropertiesError::Serialize)
    }

    /// Parse from a JSON map; wrong-shaped structures (including wrong
    /// element types inside nested lists) are a [`PropertiesError::Parse`].
    fn from_value(value: serde_json::Value) -> Result<Self, PropertiesError> {
        serde_json::from_value(value).map_err(PropertiesError::Parse)
    }
}

impl Properties for PackageProperties {}
impl Properties for ResourceProperties {}
impl Properties for TableSchemaProperties {}
impl Properties for FieldProperties {}
