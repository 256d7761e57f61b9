//! # Object Model
//!
//! The object model binds the declarative configuration to what the model
//! sources actually declare. Every emitter reads from it, so naming,
//! versioning and reconciliation are decided here exactly once.
//!
//! ## Build Steps
//!
//! ```text
//! config ──┐
//!          ├─▶ seed objects ─▶ merge facts ─▶ validate ─▶ fixups ─▶ indices
//! sources ─┘
//! ```
//!
//! 1. Inspect each group's source file once per version
//! 2. Seed one [`ApiObject`] per object per version from config
//! 3. OR-merge source facts and doc markers
//! 4. Reject objects named like their group and colliding generated symbols
//! 5. Pair `<Root>Definition` with `<Root>Instance`
//! 6. Propagate reconcilers and require a `Reconciled` field (base project only)
//! 7. Propagate group-level flag lists back onto objects
//! 8. Apply database migration-order constraints
//! 9. Build the by-version indices
//!
//! ## Usage
//!
//! ```rust,ignore
//! use threeport_sdk::config::load_config;
//! use threeport_sdk::inspect::GoInspector;
//! use threeport_sdk::model::{ApiSourceLocator, ModelBuilder, RunContext};
//!
//! let config = load_config("sdk-config.yaml".as_ref())?;
//! let ctx = RunContext::detect(".".as_ref(), None)?;
//! let locator = ApiSourceLocator::new(&ctx.project_root);
//! let model = ModelBuilder::new(&ctx, &GoInspector, &locator).build(&config)?;
//! ```

mod builder;
mod context;
mod error;
mod locator;
mod naming;
mod types;


pub use builder::{apply_migration_order, default_migration_order, ModelBuilder};
pub use context::{parse_module_path, ProjectKind, RunContext, BASE_MODULE_PATH};
pub use error::ModelError;
pub use locator::{ApiSourceLocator, SourceLocator};
pub use naming::{
    camel_case, kebab_case, package_case, pascal_case, plural, snake_case, ClientNames,
    GroupNaming, HandlerNames, ObjectSymbols, Subject, SymbolScope,
};
pub use types::{
    ApiObject, ApiObjectGroup, GlobalVersionConfig, ObjectModel, ReconciledObject,
    StructTagIndex, VersionConfig, VersionedApiObjectCollection, VersionedApiObjectGroup,
    VersionedApiObjects,
};
