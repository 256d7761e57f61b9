use clap::Parser;
use threeport_sdk::cli::{run_cli, Cli};
use threeport_sdk::logging::{init_logging, LogConfig};

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env().with_verbosity(cli.verbose);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: {e:#}");
    }

    if let Err(e) = run_cli(cli) {
        tracing::error!(error = %format!("{e:#}"), "threeport-sdk failed");
        eprintln!("❌ {e}");
        for cause in e.chain().skip(1) {
            eprintln!("   caused by: {cause}");
        }
        std::process::exit(1);
    }
}
