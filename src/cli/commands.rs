use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{load_config, SdkConfig};
use crate::generator::{
    build_model, create_api_objects, generate_project, sync_project, FailurePolicy,
    GenerateOptions, Stage, WriteReport,
};
use crate::model::RunContext;

/// Command-line interface for the threeport SDK
///
/// Scaffolds model sources and regenerates the API server, client library,
/// tptctl commands and controllers from an SDK config.
#[derive(Debug, Parser)]
#[command(name = "threeport-sdk")]
#[command(about = "Threeport SDK code generator", long_about = None)]
pub struct Cli {
    /// Root of the Go project to generate into
    #[arg(long, global = true, default_value = ".")]
    pub project_root: PathBuf,

    /// Go module path of an extension project (default: read from go.mod)
    #[arg(long, global = true)]
    pub extension_module: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scaffold resources in the project
    Create {
        #[command(subcommand)]
        what: CreateCommands,
    },
    /// Generate all source code for the configured API objects
    Gen {
        /// Path to the SDK config file
        #[arg(short, long)]
        config: PathBuf,

        /// Run only these stages (comma-separated or repeated)
        #[arg(long, value_enum, num_args = 1.., value_delimiter = ',')]
        only: Vec<Stage>,

        /// Show what would be written without touching the filesystem
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Keep running remaining emitters after a failure and report all of them
        #[arg(long, default_value_t = false)]
        keep_going: bool,
    },
    /// Regenerate, then delete generated files that are no longer produced
    Sync {
        /// Path to the SDK config file
        #[arg(short, long)]
        config: PathBuf,

        /// Show what would be written and deleted
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print the resolved object model as JSON
    Inspect {
        /// Path to the SDK config file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the version
    Version,
}

/// Resources `create` can scaffold
#[derive(Debug, Subcommand)]
pub enum CreateCommands {
    /// Write model source stubs for every configured group and version
    ///
    /// Existing files are left untouched.
    ApiObjects {
        /// Path to the SDK config file
        #[arg(short, long)]
        config: PathBuf,

        /// Show which files would be created
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

impl Cli {
    fn run_context(&self) -> anyhow::Result<RunContext> {
        RunContext::detect(&self.project_root, self.extension_module.as_deref())
    }
}

fn load(config: &Path) -> anyhow::Result<SdkConfig> {
    load_config(config).with_context(|| format!("Could not load {}", config.display()))
}

fn print_report(report: &WriteReport) {
    for path in &report.written {
        println!("✅ Generated {}", path.display());
    }
    for path in &report.would_write {
        println!("📝 Would write {}", path.display());
    }
    for path in &report.skipped {
        println!("⚠️  Skipping existing {}", path.display());
    }
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Returns an error if:
/// - The config file cannot be read or fails validation
/// - The project kind cannot be resolved from `go.mod`
/// - The model sources are missing or inconsistent with the config
/// - An emitter or file write fails
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Create {
            what: CreateCommands::ApiObjects { config, dry_run },
        } => {
            let sdk_config = load(config)?;
            let ctx = cli.run_context()?;
            let report = create_api_objects(&sdk_config, &ctx, *dry_run)?;
            print_report(&report);
            Ok(())
        }
        Commands::Gen {
            config,
            only,
            dry_run,
            keep_going,
        } => {
            let sdk_config = load(config)?;
            let ctx = cli.run_context()?;
            let options = GenerateOptions {
                only: only.clone(),
                dry_run: *dry_run,
                policy: if *keep_going {
                    FailurePolicy::CollectAll
                } else {
                    FailurePolicy::HaltOnFirst
                },
            };
            let report = generate_project(&sdk_config, &ctx, &options)?;
            print_report(&report);
            println!(
                "{} file(s) {}",
                report.produced().count(),
                if *dry_run { "planned" } else { "generated" }
            );
            Ok(())
        }
        Commands::Sync { config, dry_run } => {
            let sdk_config = load(config)?;
            let ctx = cli.run_context()?;
            let outcome = sync_project(&sdk_config, &ctx, *dry_run)?;
            print_report(&outcome.report);
            for path in &outcome.pruned {
                if *dry_run {
                    println!("🗑️ Would delete stale {}", path.display());
                } else {
                    println!("🗑️ Deleted stale {}", path.display());
                }
            }
            Ok(())
        }
        Commands::Inspect { config } => {
            let sdk_config = load(config)?;
            let ctx = cli.run_context()?;
            let model = build_model(&sdk_config, &ctx)?;
            let json = serde_json::to_string_pretty(&model)
                .context("Failed to serialize object model")?;
            println!("{json}");
            Ok(())
        }
        Commands::Version => {
            println!("threeport-sdk {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
