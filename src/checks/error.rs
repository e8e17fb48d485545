//! Normalized check error records and their aggregation

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use thiserror::Error;

/// One normalized validation failure against the standard or the Sprout
/// rules.
///
/// Two errors are equal iff message, json_path and validator all match;
/// ordering is total over (json_path, validator, message) so that any error
/// list can be deduplicated and reported deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckError {
    /// Human-readable description of the failure
    pub message: String,
    /// Pointer into the properties tree, e.g. `$.resources[0].name`
    pub json_path: String,
    /// Symbolic rule name, e.g. `required`, `pattern`, `blank`
    pub validator: String,
}

impl CheckError {
    pub fn new(
        message: impl Into<String>,
        json_path: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            json_path: json_path.into(),
            validator: validator.into(),
        }
    }

    /// Re-root the error under a new base path, e.g. rebasing `$.path`
    /// under `$.resources[0]` gives `$.resources[0].path`.
    pub fn rebase(&self, base: &str) -> Self {
        let suffix = self.json_path.strip_prefix('$').unwrap_or(&self.json_path);
        Self {
            message: self.message.clone(),
            json_path: format!("{base}{suffix}"),
            validator: self.validator.clone(),
        }
    }
}

impl Ord for CheckError {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.json_path, &self.validator, &self.message).cmp(&(
            &other.json_path,
            &other.validator,
            &other.message,
        ))
    }
}

impl PartialOrd for CheckError {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.json_path, self.validator, self.message)
    }
}

/// Matcher for selectively excluding known-acceptable check errors.
///
/// Every supplied part must match for an error to be excluded: `message`
/// matches as a substring, `json_path` as an exact value or suffix,
/// `validator` exactly. A matcher with no parts set matches nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckErrorMatcher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

impl CheckErrorMatcher {
    pub fn matches(&self, error: &CheckError) -> bool {
        if self.message.is_none() && self.json_path.is_none() && self.validator.is_none() {
            return false;
        }
        if let Some(message) = &self.message {
            if !error.message.contains(message.as_str()) {
                return false;
            }
        }
        if let Some(json_path) = &self.json_path {
            if &error.json_path != json_path && !error.json_path.ends_with(json_path.as_str()) {
                return false;
            }
        }
        if let Some(validator) = &self.validator {
            if &error.validator != validator {
                return false;
            }
        }
        true
    }
}

/// Drop every error matched by any of the matchers.
pub fn exclude_matching(
    errors: Vec<CheckError>,
    matchers: &[CheckErrorMatcher],
) -> Vec<CheckError> {
    errors
        .into_iter()
        .filter(|error| !matchers.iter().any(|matcher| matcher.matches(error)))
        .collect()
}

/// Deduplicate (set semantics) and sort by (json_path, validator, message).
pub fn dedupe_and_sort(errors: Vec<CheckError>) -> Vec<CheckError> {
    errors
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Aggregate of every check failure found in one call.
///
/// Always raised as a whole, never one error at a time; guaranteed
/// non-empty, deduplicated and sorted.
#[derive(Debug, Error, Serialize, Deserialize)]
#[must_use = "check failures must be reported, not dropped"]
pub struct CheckErrors {
    errors: Vec<CheckError>,
}

impl CheckErrors {
    /// Build from collected errors, deduplicating and sorting. Returns
    /// `None` when there is nothing to report.
    pub fn from_errors(errors: Vec<CheckError>) -> Option<Self> {
        let errors = dedupe_and_sort(errors);
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn errors(&self) -> &[CheckError] {
        &self.errors
    }
}

impl std::fmt::Display for CheckErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} property check failure(s):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  {error}")?;
        }
        Ok(())
    }
}
