//! # CLI Module
//!
//! Command-line front end for the `threeport-sdk` binary.
//!
//! ## Commands
//!
//! ### `create api-objects`
//!
//! Scaffold the hand-written model source files, one per group per version:
//!
//! ```bash
//! threeport-sdk create api-objects --config sdk-config.yaml
//! ```
//!
//! ### `gen`
//!
//! Build the object model and regenerate every `*_gen.go` file:
//!
//! ```bash
//! threeport-sdk gen --config sdk-config.yaml
//! threeport-sdk gen --config sdk-config.yaml --only api-model,handlers --dry-run
//! ```
//!
//! Options:
//! - `--only <STAGE,..>` - Run only the named stages
//! - `--dry-run` - Report what would be written
//! - `--keep-going` - Run every emitter and report all failures together
//!
//! ### `sync`
//!
//! `gen`, followed by deletion of generated files this run no longer produces.
//!
//! ### `inspect`
//!
//! Print the resolved object model as JSON on stdout.
//!
//! ## Global Options
//!
//! - `--project-root <DIR>` - Go project root (default `.`)
//! - `--extension-module <PATH>` - Module path for an extension project;
//!   otherwise read from `go.mod`
//! - `-v` / `-vv` - Debug / trace logging on stderr
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use threeport_sdk::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands, CreateCommands};
