//! Sprout-specific mandatory checks layered on the standard
//!
//! Each rule is computed independently and merged with the standard-level
//! errors; the merged list is filtered, deduplicated, sorted, and raised as
//! one aggregate failure. Rules:
//!
//! - a Sprout required-field set (superset of the standard's) must be
//!   present (`required`) and non-blank (`blank`)
//! - a resource `path` must be a string (`type`) with exactly three path
//!   segments and an all-digit middle segment, the resource id (`pattern`)
//! - inline `data` is never permitted (`inline-data`)

use super::error::{exclude_matching, CheckError, CheckErrorMatcher, CheckErrors};
use super::standard;
use serde_json::Value;

/// Shape a required field takes, determining its "blank" sentinel.
#[derive(Debug, Clone, Copy)]
enum RequiredKind {
    /// Blank when equal to `""`
    Str,
    /// Blank when equal to `[]`
    List,
}

/// Fields Sprout requires on every package, beyond the standard.
const PACKAGE_REQUIRED: &[(&str, RequiredKind)] = &[
    ("created", RequiredKind::Str),
    ("description", RequiredKind::Str),
    ("title", RequiredKind::Str),
    ("version", RequiredKind::Str),
];

/// Fields Sprout requires on every resource, beyond the standard.
const RESOURCE_REQUIRED: &[(&str, RequiredKind)] = &[
    ("description", RequiredKind::Str),
    ("title", RequiredKind::Str),
];

/// Standard-engine errors that are irrelevant under the Sprout rules and
/// always filtered out before merging: absence of inline `data` is
/// intentional, and array-form paths are rejected by the Sprout path rule
/// rather than the standard's union type.
fn known_irrelevant() -> [CheckErrorMatcher; 2] {
    [
        CheckErrorMatcher {
            json_path: Some("$.data".to_string()),
            validator: Some("required".to_string()),
            ..Default::default()
        },
        CheckErrorMatcher {
            message: Some("array".to_string()),
            json_path: Some("path".to_string()),
            validator: Some("type".to_string()),
        },
    ]
}

/// Check package properties (envelope only) against the standard plus the
/// Sprout package rules.
pub fn check_package_properties(
    properties: &Value,
    recommendations: bool,
) -> Result<(), CheckErrors> {
    check_package_properties_with_ignore(properties, recommendations, &[])
}

/// As [`check_package_properties`], additionally suppressing every error
/// matched by one of the caller's matchers.
pub fn check_package_properties_with_ignore(
    properties: &Value,
    recommendations: bool,
    ignore: &[CheckErrorMatcher],
) -> Result<(), CheckErrors> {
    raise(collect_package_errors(properties, recommendations, ignore))
}

/// Check resource properties against the standard plus the Sprout resource
/// rules.
pub fn check_resource_properties(
    properties: &Value,
    recommendations: bool,
) -> Result<(), CheckErrors> {
    check_resource_properties_with_ignore(properties, recommendations, &[])
}

/// As [`check_resource_properties`], additionally suppressing every error
/// matched by one of the caller's matchers.
pub fn check_resource_properties_with_ignore(
    properties: &Value,
    recommendations: bool,
    ignore: &[CheckErrorMatcher],
) -> Result<(), CheckErrors> {
    raise(collect_resource_errors(properties, recommendations, ignore))
}

/// Check a whole package: the envelope plus every resource, with resource
/// errors re-rooted at `$.resources[i]`.
pub fn check_properties(properties: &Value, recommendations: bool) -> Result<(), CheckErrors> {
    let mut errors = collect_package_errors(properties, recommendations, &[]);
    if let Some(resources) = properties.get("resources").and_then(Value::as_array) {
        for (index, resource) in resources.iter().enumerate() {
            let base = format!("$.resources[{index}]");
            errors.extend(
                collect_resource_errors(resource, recommendations, &[])
                    .into_iter()
                    .map(|error| error.rebase(&base)),
            );
        }
    }
    raise(errors)
}

fn raise(errors: Vec<CheckError>) -> Result<(), CheckErrors> {
    match CheckErrors::from_errors(errors) {
        Some(errors) => Err(errors),
        None => Ok(()),
    }
}

fn collect_package_errors(
    properties: &Value,
    recommendations: bool,
    ignore: &[CheckErrorMatcher],
) -> Vec<CheckError> {
    let mut errors = standard::check_package(properties, recommendations);
    errors.extend(presence_and_blank_errors(properties, PACKAGE_REQUIRED));
    let errors = exclude_matching(errors, &known_irrelevant());
    exclude_matching(errors, ignore)
}

fn collect_resource_errors(
    properties: &Value,
    recommendations: bool,
    ignore: &[CheckErrorMatcher],
) -> Vec<CheckError> {
    let mut errors = standard::check_resource(properties, recommendations);
    errors.extend(presence_and_blank_errors(properties, RESOURCE_REQUIRED));
    errors.extend(path_shape_errors(properties));
    errors.extend(inline_data_errors(properties));
    let errors = exclude_matching(errors, &known_irrelevant());
    exclude_matching(errors, ignore)
}

/// Presence (`required`) and non-blank (`blank`) checks over a required
/// field set. A field of the wrong type is neither absent nor blank; the
/// standard engine reports it.
fn presence_and_blank_errors(
    properties: &Value,
    required: &[(&str, RequiredKind)],
) -> Vec<CheckError> {
    let mut errors = Vec::new();
    for (name, kind) in required {
        match properties.get(name) {
            None => errors.push(CheckError::new(
                standard::required_message(name),
                format!("$.{name}"),
                "required",
            )),
            Some(value) => {
                let blank = match kind {
                    RequiredKind::Str => value.as_str() == Some(""),
                    RequiredKind::List => value.as_array().is_some_and(Vec::is_empty),
                };
                if blank {
                    errors.push(CheckError::new(
                        format!("'{name}' must not be blank"),
                        format!("$.{name}"),
                        "blank",
                    ));
                }
            }
        }
    }
    errors
}

/// The resource path rule: a present path must be a string (`type`), and a
/// string path must have exactly three segments with an all-digit middle
/// segment (`pattern`). A missing or wrong-typed path never produces the
/// shape error on top.
fn path_shape_errors(properties: &Value) -> Vec<CheckError> {
    match properties.get("path") {
        None => Vec::new(),
        Some(Value::String(path)) => {
            if crate::paths::extract_resource_id(path).is_some() {
                Vec::new()
            } else {
                vec![CheckError::new(
                    format!(
                        "'{path}' does not match the expected layout \
                         'resources/<id>/<file>' with a numeric resource id"
                    ),
                    "$.path",
                    "pattern",
                )]
            }
        }
        Some(_) => vec![CheckError::new(
            "'path' must be of type 'string'",
            "$.path",
            "type",
        )],
    }
}

/// Inline data is forbidden: resources always reference a file by path.
fn inline_data_errors(properties: &Value) -> Vec<CheckError> {
    if properties.get("data").is_some() {
        vec![CheckError::new(
            "inline 'data' is not allowed, resources reference their data file by path",
            "$.data",
            "inline-data",
        )]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn passing_package() -> Value {
        json!({
            "name": "heart-study",
            "id": "9e4b8f7a-0000-4000-8000-000000000000",
            "title": "Heart study",
            "description": "Data from the heart study",
            "version": "0.1.0",
            "created": "2024-05-14T05:09:03+00:00",
            "licenses": [{"name": "odc-pddl"}],
            "resources": []
        })
    }

    fn passing_resource() -> Value {
        json!({
            "name": "patients",
            "path": "resources/1/data.parquet",
            "type": "table",
            "title": "Patients",
            "description": "One row per patient"
        })
    }

    #[test]
    fn passing_package_yields_no_errors() {
        assert!(check_package_properties(&passing_package(), true).is_ok());
        // idempotence: re-running on an already-passing object stays clean
        assert!(check_package_properties(&passing_package(), true).is_ok());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let mut properties = passing_package();
        properties["title"] = json!("");
        let errors = check_package_properties(&properties, false).unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].validator, "blank");
        assert_eq!(errors.errors()[0].json_path, "$.title");
    }

    #[test]
    fn missing_sprout_required_fields_collapse_across_layers() {
        let mut properties = passing_package();
        properties.as_object_mut().unwrap().remove("title");
        // recommendations also require title; the two layers must report one
        // deduplicated error
        let errors = check_package_properties(&properties, true).unwrap_err();
        let on_title: Vec<_> = errors
            .errors()
            .iter()
            .filter(|e| e.json_path == "$.title")
            .collect();
        assert_eq!(on_title.len(), 1);
        assert_eq!(on_title[0].validator, "required");
    }

    #[test]
    fn resource_path_shape_is_enforced() {
        for (path, expected) in [
            ("resources/1/data.parquet", None),
            ("data.parquet", Some("pattern")),
            ("resources/abc/data.parquet", Some("pattern")),
        ] {
            let mut properties = passing_resource();
            properties["path"] = json!(path);
            let result = check_resource_properties(&properties, false);
            match expected {
                None => assert!(result.is_ok(), "{path} should pass"),
                Some(validator) => {
                    let errors = result.unwrap_err();
                    assert!(
                        errors
                            .errors()
                            .iter()
                            .any(|e| e.json_path == "$.path" && e.validator == validator),
                        "{path} should fail with {validator}"
                    );
                }
            }
        }
    }

    #[test]
    fn non_string_path_is_a_type_error_without_shape_error() {
        let mut properties = passing_resource();
        properties["path"] = json!(["resources/1/data.parquet"]);
        let errors = check_resource_properties(&properties, false).unwrap_err();
        let on_path: Vec<_> = errors
            .errors()
            .iter()
            .filter(|e| e.json_path == "$.path")
            .collect();
        assert_eq!(on_path.len(), 1);
        assert_eq!(on_path[0].validator, "type");
    }

    #[test]
    fn inline_data_is_rejected() {
        let mut properties = passing_resource();
        properties["data"] = json!([{"id": 1}]);
        let errors = check_resource_properties(&properties, false).unwrap_err();
        assert!(errors
            .errors()
            .iter()
            .any(|e| e.validator == "inline-data" && e.json_path == "$.data"));
    }

    #[test]
    fn caller_matchers_suppress_selected_errors() {
        let mut properties = passing_resource();
        properties.as_object_mut().unwrap().remove("title");
        let ignore = [CheckErrorMatcher {
            json_path: Some("$.title".to_string()),
            validator: Some("required".to_string()),
            ..Default::default()
        }];
        assert!(check_resource_properties_with_ignore(&properties, false, &ignore).is_ok());
    }

    #[test]
    fn whole_package_check_reroots_resource_errors() {
        let mut properties = passing_package();
        let mut resource = passing_resource();
        resource["path"] = json!("nope.parquet");
        properties["resources"] = json!([passing_resource(), resource]);
        // the second resource's path errors land under $.resources[1]
        properties["resources"][0]["path"] = json!("resources/1/data.parquet");

        let errors = check_properties(&properties, true).unwrap_err();
        assert!(errors
            .errors()
            .iter()
            .any(|e| e.json_path == "$.resources[1].path" && e.validator == "pattern"));
        assert!(!errors
            .errors()
            .iter()
            .any(|e| e.json_path.starts_with("$.resources[0]")));
    }
}
