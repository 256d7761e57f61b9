use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;

use super::error::ConfigError;
use super::types::{is_valid_version, SdkConfig};

/// Load and validate an SDK config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid YAML, contains
/// unknown keys, or fails [`validate_config`].
pub fn load_config(config_path: &Path) -> anyhow::Result<SdkConfig> {
    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read SDK config: {}", config_path.display()))?;
    parse_config(&contents)
        .with_context(|| format!("Invalid SDK config: {}", config_path.display()))
}

/// Parse and validate SDK config YAML from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<SdkConfig> {
    let config: SdkConfig = serde_yaml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Check the structural rules that deserialization cannot express.
pub fn validate_config(config: &SdkConfig) -> Result<(), ConfigError> {
    if config.api_namespace.trim().is_empty() {
        return Err(ConfigError::MissingApiNamespace);
    }

    let mut groups = HashSet::new();
    for (index, group) in config.api_object_groups.iter().enumerate() {
        if group.name.trim().is_empty() {
            return Err(ConfigError::EmptyGroupName { index });
        }
        if !groups.insert(group.name.as_str()) {
            return Err(ConfigError::DuplicateGroup {
                group: group.name.clone(),
            });
        }

        let mut objects = HashSet::new();
        for object in &group.objects {
            if object.name.trim().is_empty() {
                return Err(ConfigError::EmptyObjectName {
                    group: group.name.clone(),
                });
            }
            if !objects.insert(object.name.as_str()) {
                return Err(ConfigError::DuplicateObject {
                    group: group.name.clone(),
                    object: object.name.clone(),
                });
            }
            if object.versions.is_empty() {
                return Err(ConfigError::NoVersions {
                    group: group.name.clone(),
                    object: object.name.clone(),
                });
            }
            if let Some(bad) = object.versions.iter().find(|v| !is_valid_version(v)) {
                return Err(ConfigError::InvalidVersion {
                    group: group.name.clone(),
                    object: object.name.clone(),
                    version: bad.clone(),
                });
            }
        }
    }

    for order in config.database_migration_order.iter().flatten() {
        if order.before.is_empty() || order.after.is_empty() || order.before == order.after {
            return Err(ConfigError::InvalidMigrationOrder {
                before: order.before.clone(),
                after: order.after.clone(),
            });
        }
    }

    Ok(())
}
