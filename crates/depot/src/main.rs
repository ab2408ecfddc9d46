//! Depot CLI binary.
//!
//! This binary provides command-line access to a Depot store:
//! - Upload, inspect, update and delete files
//! - List and search records
//! - Produce derived images and run the expiry sweep

use clap::Parser;
use depot::{ObservabilityConfig, init_observability};
use std::process::ExitCode;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    use cli::{Cli, run};

    // Pick up DEPOT_* overrides from a local .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut observability = ObservabilityConfig::from_env().with_json_logs(cli.json_logs);
    if cli.verbose {
        observability = observability.with_log_level("debug");
    }
    if let Err(e) = init_observability(&observability) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            let report = serde_json::json!({
                "error": e.category().to_string(),
                "message": e.public_message(),
            });
            eprintln!("{}", report);
            ExitCode::FAILURE
        }
    }
}
