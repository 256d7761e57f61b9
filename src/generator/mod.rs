//! # Generator Module
//!
//! Turns a resolved [`ObjectModel`](crate::model::ObjectModel) into Go source
//! for the API server, client library, `tptctl` and controllers.
//!
//! ## Architecture
//!
//! Every generated file kind is described by one [`EmitterSpec`]: its stage,
//! the slice of the model it is rendered for, a path template and an Askama
//! render function. The [`Pipeline`] runs the table in stage order and hands
//! each [`Artifact`] to the [`FileWriter`].
//!
//! ```text
//! ObjectModel → EmitterSpec::artifacts → Pipeline → FileWriter → files
//! ```
//!
//! ## Generated Layout
//!
//! ```text
//! pkg/api/<version>/<group>_gen.go                 # constants, subjects, object methods
//! pkg/api/<version>/notifications_gen.go           # stream list
//! pkg/api-server/<version>/versions/<group>_gen.go # struct tag index
//! pkg/api-server/<version>/routes/*_gen.go         # echo routes
//! pkg/api-server/<version>/handlers/<group>_gen.go # REST handlers
//! pkg/api-server/<version>/database/database_gen.go
//! pkg/client/<version>/<group>_gen.go              # client library
//! cmd/tptctl/cmd/<group>_gen.go                    # tptctl commands
//! cmd/tptctl/cmd/<group>_output.go                 # scaffold
//! cmd/<controller>/main_gen.go                     # controller entrypoint
//! cmd/<controller>/image/Dockerfile
//! internal/<package>/reconcilers_gen.go
//! internal/<package>/<object>.go                   # scaffold
//! ```
//!
//! Files ending in `_gen.go` are overwritten on every run. `sync` deletes
//! only those whose path matches one of the emitter path templates above. Scaffolds are written once and then belong to
//! the developer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use threeport_sdk::generator::{generate_project, GenerateOptions};
//!
//! let report = generate_project(&config, &ctx, &GenerateOptions::default())?;
//! println!("{} files written", report.written.len());
//! ```

mod emitter;
mod emitters;
mod pipeline;
mod project;
mod scaffold;
mod sync;
mod templates;
mod writer;

#[cfg(test)]
mod tests;

pub use emitter::{expand_path, Artifact, EmitterSpec, Granularity, Stage, Target, WriteMode};
pub use emitters::DEFAULT_EMITTERS;
pub use pipeline::{FailurePolicy, Pipeline};
pub use project::{
    build_model, create_api_objects, generate_project, sync_project, GenerateOptions,
    SyncOutcome,
};
pub use scaffold::scaffold_model_sources;
pub use sync::{path_matcher, prune_stale, GENERATED_DIRS, GENERATED_SUFFIX};
pub use templates::go_quote;
pub use writer::{write_file, FileWriter, WriteOutcome, WriteReport};
