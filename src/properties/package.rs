//! Package properties: the manifest-level metadata record

use super::resource::ResourceProperties;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version given to a package that does not declare one.
pub const DEFAULT_PACKAGE_VERSION: &str = "0.1.0";

/// A person or organization credited on a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContributorProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// A license under which a package's data is published.
///
/// The standard expects at least one of `name` or `path` to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LicenseProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Where a package's raw data came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The package manifest record, serialized as `datapackage.json`.
///
/// All fields are sparse: unset fields are dropped on serialization, at
/// every nesting level. Construction through [`PackageProperties::new`]
/// auto-populates `id`, `version` and `created`; [`fill_defaults`] does the
/// same for an existing record without overwriting anything already set.
///
/// [`fill_defaults`]: PackageProperties::fill_defaults
///
/// # Example
///
/// ```rust
/// use sprout_sdk::properties::PackageProperties;
///
/// let package = PackageProperties::new("heart-study");
/// assert!(package.id.is_some());
/// assert_eq!(package.version.as_deref(), Some("0.1.0"));
/// assert!(package.created.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unique identifier, a UUIDv4 when auto-populated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Creation instant, ISO-8601
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<ContributorProperties>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<LicenseProperties>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceProperties>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceProperties>,
}

impl PackageProperties {
    /// Create package properties with the given name and auto-populated
    /// `id`, `version` and `created`.
    pub fn new(name: impl Into<String>) -> Self {
        let mut properties = Self {
            name: Some(name.into()),
            ..Self::default()
        };
        properties.fill_defaults();
        properties
    }

    /// Populate `id` (UUIDv4), `version` ("0.1.0") and `created` (now) for
    /// any of the three that is unset. Fields already set are left alone.
    pub fn fill_defaults(&mut self) {
        if self.id.is_none() {
            self.id = Some(Uuid::new_v4().to_string());
        }
        if self.version.is_none() {
            self.version = Some(DEFAULT_PACKAGE_VERSION.to_string());
        }
        if self.created.is_none() {
            self.created = Some(Utc::now());
        }
    }
}
