//! Resource properties: one table's metadata within a package

use super::table_schema::{FieldNames, FieldProperties, TableSchemaProperties};
use serde::{Deserialize, Serialize};

/// The only resource type this engine produces or accepts.
pub const RESOURCE_TYPE_TABLE: &str = "table";

/// Metadata of one resource (one logical table) in a data package.
///
/// The `path` must always reference a file; inline data is never permitted.
/// The canonical path embeds the resource's numeric id as its middle
/// segment, e.g. `resources/1/data.parquet`.
///
/// # Example
///
/// ```rust
/// use sprout_sdk::properties::ResourceProperties;
///
/// let resource = ResourceProperties::new("patients");
/// assert_eq!(resource.resource_type.as_deref(), Some("table"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Relative path to the resource's canonical data file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mediatype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchemaProperties>,
}

impl ResourceProperties {
    /// Create resource properties with the given name and the fixed
    /// `table` type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            resource_type: Some(RESOURCE_TYPE_TABLE.to_string()),
            ..Self::default()
        }
    }

    /// Field declarations of the resource's schema, empty when no schema is
    /// set.
    pub fn fields(&self) -> &[FieldProperties] {
        self.schema
            .as_ref()
            .map(|schema| schema.fields.as_slice())
            .unwrap_or_default()
    }

    /// The declared primary key, if any.
    pub fn primary_key(&self) -> Option<&FieldNames> {
        self.schema.as_ref()?.primary_key.as_ref()
    }
}
