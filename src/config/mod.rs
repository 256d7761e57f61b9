//! # Configuration Module
//!
//! Declarative SDK configuration: the controller domains (API object groups),
//! the objects each one owns, and the per-object generation flags.
//!
//! ## Example
//!
//! ```yaml
//! ApiNamespace: acme.io
//! ImageRepo: ghcr.io/acme
//! ApiObjectGroups:
//!   - Name: Workload
//!     Objects:
//!       - Name: WorkloadDefinition
//!         Versions: [v0]
//!         Reconcilable: true
//!         Tptctl:
//!           Enabled: true
//!       - Name: WorkloadInstance
//!         Versions: [v0]
//!         Reconcilable: true
//! ```
//!
//! Keys are PascalCase and unknown keys are rejected.

mod error;
mod load;
mod types;

pub use error::ConfigError;
pub use load::{load_config, parse_config, validate_config};
pub use types::{
    compare_versions, is_valid_version, ApiDocs, ApiObjectConfig, ApiObjectGroupConfig,
    MigrationOrder, SdkConfig, TptctlConfig, BASE_VERSION,
};
