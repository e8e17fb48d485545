//! Standard-level checks against the Data Package schemas
//!
//! Validates a properties map against the JSON-schema form of the Data
//! Package standard, collecting every violation rather than stopping at the
//! first. Union ("anyOf") failures are recursively re-validated per branch
//! and unwrapped into leaf-level errors, and `required` failures get the
//! missing member's own name appended to the reported path (the underlying
//! engine reports the parent path for those).
//!
//! Package-level checks constrain only the package envelope: the embedded
//! package schema requires `resources` to be an array and nothing more, so
//! resource internals are never validated here unless a resource is checked
//! on its own.

use super::error::{dedupe_and_sort, CheckError};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use once_cell::sync::Lazy;
use serde_json::Value;

/// A schema document together with its compiled validator. The document is
/// kept so union branches can be looked up and re-validated individually.
struct CompiledSchema {
    doc: Value,
    validator: Validator,
}

impl CompiledSchema {
    fn new(source: &str) -> Self {
        let doc: Value =
            serde_json::from_str(source).expect("embedded Data Package schema is valid JSON");
        let validator = build_validator(&doc).expect("embedded Data Package schema compiles");
        Self { doc, validator }
    }
}

fn build_validator(doc: &Value) -> Result<Validator, ValidationError<'static>> {
    jsonschema::options().should_validate_formats(true).build(doc)
}

static PACKAGE_SCHEMA: Lazy<CompiledSchema> =
    Lazy::new(|| CompiledSchema::new(include_str!("../../schemas/data-package.json")));

static PACKAGE_RECOMMENDATIONS_SCHEMA: Lazy<CompiledSchema> = Lazy::new(|| {
    CompiledSchema::new(include_str!("../../schemas/data-package-recommendations.json"))
});

static RESOURCE_SCHEMA: Lazy<CompiledSchema> =
    Lazy::new(|| CompiledSchema::new(include_str!("../../schemas/data-resource.json")));

static RESOURCE_RECOMMENDATIONS_SCHEMA: Lazy<CompiledSchema> = Lazy::new(|| {
    CompiledSchema::new(include_str!("../../schemas/data-resource-recommendations.json"))
});

/// Check a package properties map against the standard. With
/// `recommendations` set, the recommended required set and the name/semver
/// patterns are enforced on top of the bare structural requirements.
pub fn check_package(properties: &Value, recommendations: bool) -> Vec<CheckError> {
    let mut errors = collect_schema_errors(&PACKAGE_SCHEMA, properties);
    if recommendations {
        errors.extend(collect_schema_errors(
            &PACKAGE_RECOMMENDATIONS_SCHEMA,
            properties,
        ));
    }
    dedupe_and_sort(errors)
}

/// Check a resource properties map against the standard.
pub fn check_resource(properties: &Value, recommendations: bool) -> Vec<CheckError> {
    let mut errors = collect_schema_errors(&RESOURCE_SCHEMA, properties);
    if recommendations {
        errors.extend(collect_schema_errors(
            &RESOURCE_RECOMMENDATIONS_SCHEMA,
            properties,
        ));
    }
    dedupe_and_sort(errors)
}

fn collect_schema_errors(schema: &CompiledSchema, instance: &Value) -> Vec<CheckError> {
    let mut out = Vec::new();
    for error in schema.validator.iter_errors(instance) {
        flatten_error(&schema.doc, "$", &error, &mut out);
    }
    out
}

/// Convert one engine error into leaf-level check errors, recursively
/// unwrapping union failures by re-validating the failing fragment against
/// each branch schema.
fn flatten_error(doc: &Value, base: &str, error: &ValidationError<'_>, out: &mut Vec<CheckError>) {
    match error.kind() {
        ValidationErrorKind::AnyOf { .. } | ValidationErrorKind::OneOfNotValid { .. } => {
            if !unwrap_union(doc, base, error, out) {
                out.push(to_check_error(base, error));
            }
        }
        _ => out.push(to_check_error(base, error)),
    }
}

/// Re-validate a union failure against each branch schema, flattening the
/// branch failures in place. Returns false when the branches cannot be
/// located or compiled, in which case the caller reports the raw error.
fn unwrap_union(
    doc: &Value,
    base: &str,
    error: &ValidationError<'_>,
    out: &mut Vec<CheckError>,
) -> bool {
    let Some(branches) = doc
        .pointer(error.schema_path().as_str())
        .and_then(Value::as_array)
    else {
        return false;
    };

    let fragment_base = json_path_from_pointer(base, error.instance_path().as_str());
    let mut unwrapped = false;
    for branch in branches {
        let Ok(validator) = build_validator(branch) else {
            continue;
        };
        for branch_error in validator.iter_errors(error.instance()) {
            flatten_error(branch, &fragment_base, &branch_error, out);
            unwrapped = true;
        }
    }
    unwrapped
}

fn to_check_error(base: &str, error: &ValidationError<'_>) -> CheckError {
    let mut json_path = json_path_from_pointer(base, error.instance_path().as_str());
    let mut message = error.to_string();
    // The engine reports missing members at the parent path with the member
    // name only inside the message; point at the member itself and use the
    // normalized message form so the same failure reported by another layer
    // deduplicates against this one.
    if let ValidationErrorKind::Required { property } = error.kind() {
        if let Some(name) = property.as_str() {
            json_path.push('.');
            json_path.push_str(name);
            message = required_message(name);
        }
    }
    CheckError::new(message, json_path, keyword_for(error.kind()))
}

/// Normalized message for a missing required member, shared with the
/// product-level presence checks.
pub(crate) fn required_message(name: &str) -> String {
    format!("'{name}' is a required property")
}

/// Translate a JSON pointer ("/resources/0/name") into the reported path
/// form ("$.resources[0].name") under the given base.
fn json_path_from_pointer(base: &str, pointer: &str) -> String {
    let mut path = base.to_string();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            path.push('.');
            path.push_str(&segment);
        }
    }
    path
}

fn keyword_for(kind: &ValidationErrorKind) -> &'static str {
    match kind {
        ValidationErrorKind::Required { .. } => "required",
        ValidationErrorKind::Type { .. } => "type",
        ValidationErrorKind::Pattern { .. } => "pattern",
        ValidationErrorKind::Format { .. } => "format",
        ValidationErrorKind::Enum { .. } => "enum",
        ValidationErrorKind::Constant { .. } => "const",
        ValidationErrorKind::MinLength { .. } => "minLength",
        ValidationErrorKind::MaxLength { .. } => "maxLength",
        ValidationErrorKind::Minimum { .. } => "minimum",
        ValidationErrorKind::Maximum { .. } => "maximum",
        ValidationErrorKind::ExclusiveMinimum { .. } => "exclusiveMinimum",
        ValidationErrorKind::ExclusiveMaximum { .. } => "exclusiveMaximum",
        ValidationErrorKind::MultipleOf { .. } => "multipleOf",
        ValidationErrorKind::MinItems { .. } => "minItems",
        ValidationErrorKind::MaxItems { .. } => "maxItems",
        ValidationErrorKind::UniqueItems { .. } => "uniqueItems",
        ValidationErrorKind::MinProperties { .. } => "minProperties",
        ValidationErrorKind::MaxProperties { .. } => "maxProperties",
        ValidationErrorKind::AdditionalProperties { .. } => "additionalProperties",
        ValidationErrorKind::AdditionalItems { .. } => "additionalItems",
        ValidationErrorKind::PropertyNames { .. } => "propertyNames",
        ValidationErrorKind::Contains { .. } => "contains",
        ValidationErrorKind::AnyOf { .. } => "anyOf",
        ValidationErrorKind::OneOfNotValid { .. } | ValidationErrorKind::OneOfMultipleValid { .. } => {
            "oneOf"
        }
        ValidationErrorKind::Not { .. } => "not",
        _ => "schema",
    }
}
