//! # threeport-sdk
//!
//! Code generator for Threeport control-plane extensions. A developer
//! declares API objects in a YAML config and writes Go model structs; the
//! generator produces the REST handlers, routes, database registration,
//! client library, `tptctl` commands and controller scaffolding that go
//! with them.
//!
//! ## Architecture
//!
//! - **[`config`]** - SDK config YAML and its validation
//! - **[`inspect`]** - Go model source inspection (structs, fields, tags, doc markers)
//! - **[`model`]** - Object model builder that merges config with source facts
//! - **[`generator`]** - Emitter table, pipeline and file writer
//! - **[`cli`]** - `threeport-sdk` command line
//! - **[`logging`]** - `tracing-subscriber` setup for the binary
//!
//! ```text
//! sdk-config.yaml ─▶ config ─┐
//!                            ├─▶ model::ModelBuilder ─▶ generator::Pipeline ─▶ *_gen.go
//! pkg/api/<v>/*.go ─▶ inspect┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use threeport_sdk::config::load_config;
//! use threeport_sdk::generator::{generate_project, GenerateOptions};
//! use threeport_sdk::model::RunContext;
//!
//! let config = load_config("sdk-config.yaml".as_ref())?;
//! let ctx = RunContext::detect(".".as_ref(), None)?;
//! let report = generate_project(&config, &ctx, &GenerateOptions::default())?;
//! ```

pub mod cli;
pub mod config;
pub mod generator;
pub mod inspect;
pub mod logging;
pub mod model;
