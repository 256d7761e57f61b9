use std::fmt;

/// Validation failure in an SDK config file.
///
/// Raised after deserialization succeeded but before any source is parsed, so
/// no generation is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `ApiNamespace` is missing or empty
    MissingApiNamespace,
    /// A group has an empty `Name`
    EmptyGroupName {
        /// Zero-based position in `ApiObjectGroups`
        index: usize,
    },
    /// Two groups share a name
    DuplicateGroup {
        /// The repeated group name
        group: String,
    },
    /// An object has an empty `Name`
    EmptyObjectName {
        /// Owning group
        group: String,
    },
    /// Two objects in the same group share a name
    DuplicateObject {
        /// Owning group
        group: String,
        /// The repeated object name
        object: String,
    },
    /// An object lists no versions
    NoVersions {
        /// Owning group
        group: String,
        /// Object without versions
        object: String,
    },
    /// A version string is not of the form `v<N>[suffix]`
    InvalidVersion {
        /// Owning group
        group: String,
        /// Offending object
        object: String,
        /// The rejected version string
        version: String,
    },
    /// A migration constraint names the same object twice or is empty
    InvalidMigrationOrder {
        /// Object that must migrate first
        before: String,
        /// Object that must migrate second
        after: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiNamespace => {
                write!(f, "config error: ApiNamespace is required and must not be empty")
            }
            ConfigError::EmptyGroupName { index } => {
                write!(f, "config error: ApiObjectGroups[{index}] has an empty Name")
            }
            ConfigError::DuplicateGroup { group } => {
                write!(f, "config error: API object group '{group}' is declared more than once")
            }
            ConfigError::EmptyObjectName { group } => {
                write!(f, "config error: group '{group}' contains an object with an empty Name")
            }
            ConfigError::DuplicateObject { group, object } => {
                write!(
                    f,
                    "config error: object '{object}' is declared more than once in group '{group}'"
                )
            }
            ConfigError::NoVersions { group, object } => {
                write!(
                    f,
                    "config error: object '{object}' in group '{group}' lists no Versions"
                )
            }
            ConfigError::InvalidVersion {
                group,
                object,
                version,
            } => {
                write!(
                    f,
                    "config error: object '{object}' in group '{group}' has invalid version \
                    '{version}' (expected e.g. v0, v1, v1alpha1)"
                )
            }
            ConfigError::InvalidMigrationOrder { before, after } => {
                write!(
                    f,
                    "config error: invalid DatabaseMigrationOrder entry (Before: '{before}', \
                    After: '{after}'); both names are required and must differ"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
