//! Type mapping between abstract field types and physical column types
//!
//! One exhaustive match per table, keyed by the closed [`FieldType`] enum:
//! adding a field type forces every table here to be extended before the
//! crate compiles again.

use crate::properties::FieldType;
use once_cell::sync::Lazy;
use polars::prelude::DataType;
use regex::Regex;

/// Literals accepted for a string-backed boolean column.
pub const BOOLEAN_LITERALS: &[&str] = &["true", "True", "TRUE", "false", "False", "FALSE"];

static YEARMONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("yearmonth pattern is valid"));

static GEOPOINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d+(\.\d+)?,\s*-?\d+(\.\d+)?$").expect("geopoint pattern is valid")
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(\d+Y)?(\d+M)?(\d+W)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
        .expect("duration pattern is valid")
});

static TIMEZONE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Z|[+-]\d{2}:\d{2})$").expect("timezone suffix pattern is valid"));

/// Whether a physical column type is acceptable for the declared abstract
/// type. Types whose correctness cannot be expressed physically (duration,
/// object, array, geojson, and the string-backed temporal forms) accept a
/// string column and are checked value by value afterwards.
pub fn dtype_is_allowed(field_type: FieldType, dtype: &DataType) -> bool {
    match field_type {
        FieldType::String => matches!(
            dtype,
            DataType::String | DataType::Categorical(_, _) | DataType::Enum(_, _)
        ),
        FieldType::Integer => dtype.is_integer(),
        FieldType::Number => matches!(
            dtype,
            DataType::Float32 | DataType::Float64 | DataType::Decimal(_, _)
        ),
        FieldType::Boolean => matches!(dtype, DataType::Boolean | DataType::String),
        FieldType::Date => matches!(dtype, DataType::Date | DataType::String),
        FieldType::Time => matches!(dtype, DataType::Time | DataType::String),
        FieldType::Datetime => matches!(dtype, DataType::Datetime(_, _) | DataType::String),
        FieldType::Year => dtype.is_integer(),
        FieldType::YearMonth => matches!(dtype, DataType::Date | DataType::String),
        FieldType::Duration => matches!(dtype, DataType::String),
        FieldType::Geopoint => match dtype {
            DataType::String => true,
            DataType::Array(inner, size) => *size == 2 && inner.is_primitive_numeric(),
            _ => false,
        },
        FieldType::Object | FieldType::Array | FieldType::Geojson => {
            matches!(dtype, DataType::String)
        }
        FieldType::Any => true,
    }
}

/// Human-readable description of the allowed physical types, used in
/// type-mismatch error messages.
pub fn allowed_dtypes_description(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "str, categorical or enum",
        FieldType::Integer => "any integer width",
        FieldType::Number => "any float width or decimal",
        FieldType::Boolean => "bool or str",
        FieldType::Date => "date or str",
        FieldType::Time => "time or str",
        FieldType::Datetime => "datetime or str",
        FieldType::Year => "any integer width",
        FieldType::YearMonth => "date or str",
        FieldType::Duration => "str",
        FieldType::Geopoint => "str or a fixed-size-2 numeric array",
        FieldType::Object | FieldType::Array | FieldType::Geojson => "str",
        FieldType::Any => "any",
    }
}

/// Whether values of a string-backed column of this type are validated one
/// by one.
pub fn needs_value_check(field_type: FieldType) -> bool {
    match field_type {
        FieldType::Boolean
        | FieldType::Date
        | FieldType::Time
        | FieldType::Datetime
        | FieldType::YearMonth
        | FieldType::Duration
        | FieldType::Geopoint
        | FieldType::Object
        | FieldType::Array
        | FieldType::Geojson => true,
        FieldType::String | FieldType::Integer | FieldType::Number | FieldType::Year
        | FieldType::Any => false,
    }
}

/// Timezone-awareness of a string-backed datetime column, inferred from its
/// first non-null value; aware and naive values never mix within a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimezoneMode {
    Aware,
    Naive,
}

impl TimezoneMode {
    pub fn infer(first_value: &str) -> Self {
        if TIMEZONE_SUFFIX_RE.is_match(first_value) {
            Self::Aware
        } else {
            Self::Naive
        }
    }
}

/// Strict datetime validity under an inferred timezone mode.
pub fn datetime_is_valid(value: &str, mode: TimezoneMode) -> bool {
    match mode {
        TimezoneMode::Aware => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
        TimezoneMode::Naive => {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        }
    }
}

/// Single-value format validity for every content-checked type. Datetime
/// columns go through [`datetime_is_valid`] instead so the whole column
/// shares one timezone mode; the arm here accepts either form.
pub fn value_is_valid(field_type: FieldType, value: &str) -> bool {
    match field_type {
        FieldType::Boolean => BOOLEAN_LITERALS.contains(&value),
        FieldType::Date => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        FieldType::Time => chrono::NaiveTime::parse_from_str(value, "%H:%M:%S%.f").is_ok(),
        FieldType::Datetime => {
            datetime_is_valid(value, TimezoneMode::Aware)
                || datetime_is_valid(value, TimezoneMode::Naive)
        }
        FieldType::YearMonth => YEARMONTH_RE.is_match(value),
        FieldType::Duration => {
            value != "P" && !value.ends_with('T') && DURATION_RE.is_match(value)
        }
        FieldType::Geopoint => GEOPOINT_RE.is_match(value),
        FieldType::Object => parses_as(value, serde_json::Value::is_object),
        FieldType::Array => parses_as(value, serde_json::Value::is_array),
        FieldType::Geojson => parses_as(value, serde_json::Value::is_object),
        // physical types carry these; no content rule applies
        FieldType::String | FieldType::Integer | FieldType::Number | FieldType::Year
        | FieldType::Any => true,
    }
}

fn parses_as(value: &str, shape: fn(&serde_json::Value) -> bool) -> bool {
    serde_json::from_str::<serde_json::Value>(value)
        .map(|parsed| shape(&parsed))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_accepts_every_integer_width() {
        for dtype in [
            DataType::Int8,
            DataType::Int64,
            DataType::UInt16,
            DataType::UInt64,
        ] {
            assert!(dtype_is_allowed(FieldType::Integer, &dtype));
        }
        assert!(!dtype_is_allowed(FieldType::Integer, &DataType::String));
        assert!(!dtype_is_allowed(FieldType::Integer, &DataType::Float64));
    }

    #[test]
    fn geopoint_accepts_fixed_size_2_numeric_arrays() {
        let pair = DataType::Array(Box::new(DataType::Float64), 2);
        let triple = DataType::Array(Box::new(DataType::Float64), 3);
        let strings = DataType::Array(Box::new(DataType::String), 2);
        assert!(dtype_is_allowed(FieldType::Geopoint, &pair));
        assert!(!dtype_is_allowed(FieldType::Geopoint, &triple));
        assert!(!dtype_is_allowed(FieldType::Geopoint, &strings));
    }

    #[test]
    fn any_accepts_everything() {
        assert!(dtype_is_allowed(FieldType::Any, &DataType::Boolean));
        assert!(dtype_is_allowed(
            FieldType::Any,
            &DataType::List(Box::new(DataType::Int32))
        ));
    }

    #[test]
    fn boolean_literals_are_a_closed_set() {
        assert!(value_is_valid(FieldType::Boolean, "TRUE"));
        assert!(!value_is_valid(FieldType::Boolean, "yes"));
        assert!(!value_is_valid(FieldType::Boolean, "1"));
    }

    #[test]
    fn temporal_values_are_strictly_parsed() {
        assert!(value_is_valid(FieldType::Date, "2024-05-14"));
        assert!(!value_is_valid(FieldType::Date, "2024-13-01"));
        assert!(!value_is_valid(FieldType::Date, "14/05/2024"));

        assert!(value_is_valid(FieldType::Time, "05:09:03"));
        assert!(value_is_valid(FieldType::Time, "05:09:03.250"));
        assert!(!value_is_valid(FieldType::Time, "25:00:00"));

        assert!(value_is_valid(FieldType::YearMonth, "2024-05"));
        assert!(!value_is_valid(FieldType::YearMonth, "2024-13"));
        assert!(!value_is_valid(FieldType::YearMonth, "24-05"));
    }

    #[test]
    fn datetime_mode_is_inferred_from_suffix() {
        assert_eq!(
            TimezoneMode::infer("2024-05-14T05:09:03Z"),
            TimezoneMode::Aware
        );
        assert_eq!(
            TimezoneMode::infer("2024-05-14T05:09:03+02:00"),
            TimezoneMode::Aware
        );
        assert_eq!(
            TimezoneMode::infer("2024-05-14T05:09:03"),
            TimezoneMode::Naive
        );

        assert!(datetime_is_valid("2024-05-14T05:09:03Z", TimezoneMode::Aware));
        assert!(!datetime_is_valid("2024-05-14T05:09:03", TimezoneMode::Aware));
        assert!(!datetime_is_valid("2024-05-14T05:09:03Z", TimezoneMode::Naive));
    }

    #[test]
    fn durations_follow_iso_8601() {
        assert!(value_is_valid(FieldType::Duration, "P1Y2M10DT2H30M"));
        assert!(value_is_valid(FieldType::Duration, "PT15S"));
        assert!(!value_is_valid(FieldType::Duration, "P"));
        assert!(!value_is_valid(FieldType::Duration, "P1DT"));
        assert!(!value_is_valid(FieldType::Duration, "1Y"));
    }

    #[test]
    fn json_shapes_are_checked() {
        assert!(value_is_valid(FieldType::Object, r#"{"a": 1}"#));
        assert!(!value_is_valid(FieldType::Object, "[1, 2]"));
        assert!(value_is_valid(FieldType::Array, "[1, 2]"));
        assert!(!value_is_valid(FieldType::Array, r#"{"a": 1}"#));
        assert!(value_is_valid(
            FieldType::Geojson,
            r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#
        ));
        assert!(!value_is_valid(FieldType::Geojson, "not json"));
    }

    #[test]
    fn geopoints_match_the_pair_pattern() {
        assert!(value_is_valid(FieldType::Geopoint, "90.0, 45.0"));
        assert!(value_is_valid(FieldType::Geopoint, "-12.5,130"));
        assert!(!value_is_valid(FieldType::Geopoint, "90.0"));
        assert!(!value_is_valid(FieldType::Geopoint, "north, south"));
    }
}
