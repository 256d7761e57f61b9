use std::fmt;

use crate::inspect::RECONCILED_FIELD;

/// Contract violations between the configuration and the model sources.
///
/// These are design-time problems the user fixes in config or source; the
/// builder never retries or repairs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An object's type name equals its group's controller domain name.
    NamingConflict { group: String, object: String },
    /// Two objects would generate the same identifier in one package.
    SymbolCollision {
        version: String,
        symbol: String,
        first: String,
        second: String,
    },
    /// A reconciled object whose source has no reconciliation field.
    MissingReconciledField {
        group: String,
        object: String,
        version: String,
    },
    /// A migration-order constraint names objects absent from the
    /// version's database migration list.
    MigrationOrderTargetMissing {
        version: String,
        missing: Vec<String>,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NamingConflict { group, object } => write!(
                f,
                "API object {object} has the same name as its group {group}; rename the object or the group"
            ),
            ModelError::SymbolCollision {
                version,
                symbol,
                first,
                second,
            } => write!(
                f,
                "{first} and {second} both generate {symbol} in {version}"
            ),
            ModelError::MissingReconciledField {
                group,
                object,
                version,
            } => write!(
                f,
                "API object {object} ({version}, group {group}) is reconciled but its source declares no {RECONCILED_FIELD} field; add `{RECONCILED_FIELD} *bool` or embed Reconciliation"
            ),
            ModelError::MigrationOrderTargetMissing { version, missing } => write!(
                f,
                "database migration ordering for {version} references {} which {} not migrated in {version}",
                missing.join(", "),
                if missing.len() == 1 { "is" } else { "are" }
            ),
        }
    }
}

impl std::error::Error for ModelError {}
