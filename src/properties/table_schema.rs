//! Table schema properties: fields, keys, and missing-value sentinels

use super::field_type::FieldType;
use serde::{Deserialize, Serialize};

/// Default missing-value sentinels when a schema declares none.
///
/// The empty string is the standard's only default sentinel; values equal to
/// a sentinel are treated as null during data validation.
pub const DEFAULT_MISSING_VALUES: &[&str] = &[""];

/// One or more field names, serialized either as a bare string or a list.
///
/// Used for primary keys and foreign key field references, which the Data
/// Package standard allows in both forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldNames {
    Single(String),
    Composite(Vec<String>),
}

impl FieldNames {
    /// The referenced field names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Composite(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FieldNames {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<Vec<String>> for FieldNames {
    fn from(names: Vec<String>) -> Self {
        Self::Composite(names)
    }
}

/// Foreign key declaration pointing at fields of another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForeignKeyProperties {
    pub fields: FieldNames,
    pub reference: ForeignKeyReference,
}

/// Target of a foreign key: a resource name and the referenced fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForeignKeyReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub fields: FieldNames,
}

/// Value constraints attached to a single field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConstraintsProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<serde_json::Value>,
}

/// One column's schema declaration.
///
/// # Example
///
/// ```rust
/// use sprout_sdk::properties::{FieldProperties, FieldType};
///
/// let field = FieldProperties::new("id", FieldType::Integer);
/// assert_eq!(field.field_type(), FieldType::Integer);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldProperties {
    /// Field name (must match the backing column's name)
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Abstract type; absent means `any`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ConstraintsProperties>,
    /// Allowed category labels for categorical fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Per-field override of the schema-level missing-value sentinels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_values: Option<Vec<String>>,
}

impl FieldProperties {
    /// Create a field declaration with the given name and abstract type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// The declared abstract type, defaulting to `any` when unset.
    pub fn field_type(&self) -> FieldType {
        self.field_type.unwrap_or(FieldType::Any)
    }
}

/// Schema of one resource's table: ordered fields plus key declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TableSchemaProperties {
    /// Ordered field declarations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<FieldNames>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_keys: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyProperties>,
    /// Schema-level missing-value sentinels, overridable per field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_values: Option<Vec<String>>,
}

impl TableSchemaProperties {
    /// Sentinels applying to the given field: the field's own override when
    /// present, else the schema-level list, else the standard default.
    pub fn missing_values_for<'a>(&'a self, field: &'a FieldProperties) -> Vec<&'a str> {
        if let Some(values) = &field.missing_values {
            values.iter().map(String::as_str).collect()
        } else if let Some(values) = &self.missing_values {
            values.iter().map(String::as_str).collect()
        } else {
            DEFAULT_MISSING_VALUES.to_vec()
        }
    }
}
