//! The closed set of abstract field types

use serde::{Deserialize, Serialize};

/// Abstract type of a field, as declared in a resource's table schema.
///
/// The set is closed: every consumer dispatches on it with an exhaustive
/// match, so adding a type is a compile-time-checked change across the
/// type-mapping and value-check tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Date,
    Time,
    Datetime,
    Year,
    YearMonth,
    Duration,
    Geopoint,
    Object,
    Array,
    Geojson,
    Any,
}

impl FieldType {
    /// The type name as it appears in a table schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Year => "year",
            Self::YearMonth => "yearmonth",
            Self::Duration => "duration",
            Self::Geopoint => "geopoint",
            Self::Object => "object",
            Self::Array => "array",
            Self::Geojson => "geojson",
            Self::Any => "any",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
