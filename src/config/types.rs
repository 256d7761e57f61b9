use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// The API version that exists in every project and that carries the default
/// database migration ordering.
pub const BASE_VERSION: &str = "v0";

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^v([0-9]+)([a-z][a-z0-9]*)?$").expect("valid version regex")
});

/// Top-level SDK configuration, usually `sdk-config.yaml`.
///
/// Unknown keys are rejected so that a typo in a flag name fails loudly
/// instead of silently generating the wrong code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SdkConfig {
    /// Namespace used for generated API documentation and object naming.
    #[serde(default)]
    pub api_namespace: String,
    /// Container image repository for generated controller images.
    #[serde(default)]
    pub image_repo: String,
    /// Metadata for the generated API docs.
    #[serde(default)]
    pub api_docs: ApiDocs,
    /// Explicit database migration ordering constraints.
    ///
    /// When present these replace the built-in base-project constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_migration_order: Option<Vec<MigrationOrder>>,
    /// The controller domains and the objects each one owns.
    #[serde(default)]
    pub api_object_groups: Vec<ApiObjectGroupConfig>,
}

/// API documentation metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ApiDocs {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tos_link: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_url: String,
    #[serde(default)]
    pub contact_email: String,
}

/// One controller domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ApiObjectGroupConfig {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ApiObjectConfig>,
}

/// One API object type within a controller domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ApiObjectConfig {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub reconcilable: bool,
    #[serde(default)]
    pub disable_notification_persistence: bool,
    #[serde(default)]
    pub exclude_route: bool,
    #[serde(default)]
    pub exclude_from_db: bool,
    #[serde(default)]
    pub allow_custom_middleware: bool,
    #[serde(default)]
    pub allow_duplicate_model_names: bool,
    #[serde(default)]
    pub load_associations_from_db: bool,
    /// Declares the object unique by name even when the source does not
    /// embed a name-bearing field.
    #[serde(default)]
    pub name_field: bool,
    #[serde(default)]
    pub tptctl: TptctlConfig,
}

/// tptctl command generation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TptctlConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub config_path: bool,
}

/// Requires `before` to be migrated ahead of `after` in `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct MigrationOrder {
    pub before: String,
    pub after: String,
    #[serde(default = "base_version")]
    pub version: String,
}

fn base_version() -> String {
    BASE_VERSION.to_string()
}

impl MigrationOrder {
    pub fn new(before: impl Into<String>, after: impl Into<String>, version: &str) -> Self {
        MigrationOrder {
            before: before.into(),
            after: after.into(),
            version: version.to_string(),
        }
    }
}

impl SdkConfig {
    /// Every version referenced by any object, in ascending version order.
    pub fn versions(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .api_object_groups
            .iter()
            .flat_map(|g| g.objects.iter())
            .flat_map(|o| o.versions.iter().map(String::as_str))
            .collect();
        let mut versions: Vec<String> = set.into_iter().map(str::to_string).collect();
        versions.sort_by(|a, b| compare_versions(a, b));
        versions
    }
}

impl ApiObjectGroupConfig {
    /// Versions used by at least one object of this group, ascending.
    pub fn versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = Vec::new();
        for v in self.objects.iter().flat_map(|o| o.versions.iter()) {
            if !versions.contains(v) {
                versions.push(v.clone());
            }
        }
        versions.sort_by(|a, b| compare_versions(a, b));
        versions
    }
}

/// Returns true for versions of the form `v<N>` optionally followed by a
/// lowercase suffix such as `v1alpha1`.
pub fn is_valid_version(version: &str) -> bool {
    VERSION_RE.is_match(version)
}

/// Orders API versions numerically, with pre-release suffixes sorting before
/// the stable version of the same number (`v1alpha1 < v1 < v2 < v10`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    version_key(a).cmp(&version_key(b))
}

fn version_key(version: &str) -> (u64, bool, String) {
    match VERSION_RE.captures(version) {
        Some(caps) => {
            let number = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(u64::MAX);
            let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            (number, suffix.is_empty(), suffix.to_string())
        }
        None => (u64::MAX, true, version.to_string()),
    }
}
