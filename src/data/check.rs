//! Data validation against a resource's table schema
//!
//! Three passes over an in-memory table, all failures collected before
//! anything is raised: column-name parity, physical-type compatibility per
//! field, and per-value format validation for string-backed columns of
//! content-checked types.

use super::types::{
    allowed_dtypes_description, datetime_is_valid, dtype_is_allowed, needs_value_check,
    value_is_valid, TimezoneMode,
};
use crate::properties::{FieldType, TableSchemaProperties};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One failing cell: its row index and raw value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFailure {
    pub row: usize,
    pub value: String,
}

impl std::fmt::Display for ValueFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: '{}'", self.row, self.value)
    }
}

fn format_failures(failures: &[ValueFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One data check failure.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum DataCheckError {
    /// The table's column set differs from the schema's field-name set.
    #[error("column names do not match the schema fields (extra: {extra:?}, missing: {missing:?})")]
    ColumnMismatch {
        extra: Vec<String>,
        missing: Vec<String>,
    },

    /// A column's physical type is outside its field type's allow-list.
    #[error(
        "column '{field}' declared as '{field_type}' allows {allowed}, but has physical type {actual}"
    )]
    TypeMismatch {
        field: String,
        field_type: FieldType,
        allowed: String,
        actual: String,
    },

    /// Individual cells of a column fail the type's format rule.
    #[error(
        "column '{field}' has values not valid for type '{field_type}': {}",
        format_failures(.failures)
    )]
    InvalidValues {
        field: String,
        field_type: FieldType,
        failures: Vec<ValueFailure>,
    },
}

/// Aggregate of every data check failure found in one call.
#[derive(Debug, Error, Serialize, Deserialize)]
#[must_use = "data check failures must be reported, not dropped"]
pub struct DataCheckErrors {
    errors: Vec<DataCheckError>,
}

impl DataCheckErrors {
    pub fn from_errors(errors: Vec<DataCheckError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn errors(&self) -> &[DataCheckError] {
        &self.errors
    }
}

impl std::fmt::Display for DataCheckErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} data check failure(s):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  {error}")?;
        }
        Ok(())
    }
}

/// Check a table against a resource's schema fields.
///
/// Collects every failure across all three passes; value checks are skipped
/// for columns whose physical type is already wrong, and missing-value
/// sentinels (schema default `""`, overridable per field) pass every value
/// check, as do nulls.
pub fn check_data(data: &DataFrame, schema: &TableSchemaProperties) -> Result<(), DataCheckErrors> {
    let mut errors = Vec::new();

    let column_names: Vec<&str> = data.get_column_names_str();
    let field_names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();

    let extra: Vec<String> = column_names
        .iter()
        .filter(|name| !field_names.contains(name))
        .map(ToString::to_string)
        .collect();
    let missing: Vec<String> = field_names
        .iter()
        .filter(|name| !column_names.contains(name))
        .map(ToString::to_string)
        .collect();
    if !extra.is_empty() || !missing.is_empty() {
        errors.push(DataCheckError::ColumnMismatch { extra, missing });
    }

    for field in &schema.fields {
        let Ok(column) = data.column(&field.name) else {
            // reported as missing above
            continue;
        };
        let field_type = field.field_type();
        let dtype = column.dtype();

        if !dtype_is_allowed(field_type, dtype) {
            errors.push(DataCheckError::TypeMismatch {
                field: field.name.clone(),
                field_type,
                allowed: allowed_dtypes_description(field_type).to_string(),
                actual: dtype.to_string(),
            });
            continue;
        }

        if *dtype == DataType::String && needs_value_check(field_type) {
            let sentinels = schema.missing_values_for(field);
            if let Some(failures) = check_column_values(column, field_type, &sentinels) {
                errors.push(DataCheckError::InvalidValues {
                    field: field.name.clone(),
                    field_type,
                    failures,
                });
            }
        }
    }

    match DataCheckErrors::from_errors(errors) {
        Some(errors) => Err(errors),
        None => Ok(()),
    }
}

/// Run the per-value checker over a string column, returning the failing
/// cells, or `None` when every cell passes.
fn check_column_values(
    column: &Column,
    field_type: FieldType,
    sentinels: &[&str],
) -> Option<Vec<ValueFailure>> {
    let series = column.as_materialized_series();
    let Ok(values) = series.str() else {
        // physical type verified as string by the caller
        return None;
    };

    // A datetime column shares one timezone mode, inferred from its first
    // non-null, non-sentinel value.
    let timezone_mode = if field_type == FieldType::Datetime {
        values
            .into_iter()
            .flatten()
            .find(|value| !sentinels.contains(value))
            .map(TimezoneMode::infer)
    } else {
        None
    };

    let mut failures = Vec::new();
    for (row, value) in values.into_iter().enumerate() {
        let Some(value) = value else {
            continue;
        };
        if sentinels.contains(&value) {
            continue;
        }
        let valid = match timezone_mode {
            Some(mode) => datetime_is_valid(value, mode),
            None => value_is_valid(field_type, value),
        };
        if !valid {
            failures.push(ValueFailure {
                row,
                value: value.to_string(),
            });
        }
    }

    if failures.is_empty() {
        None
    } else {
        Some(failures)
    }
}
