//! TDP CLI - Main entry point

use clap::Parser;
use std::process;
use tdp_cli::commands;
use tdp_cli::error::CliError;
use tdp_cli::{Cli, Commands};
use tdp_common::logging::{init_logging, LogConfig, LogLevel};
use tracing::error;

/// Exit code when some partitions failed but the range completed
const EXIT_SOFT_FAILURE: i32 = 1;
/// Exit code for fatal faults (storage, collision, sanity, abort)
const EXIT_FATAL: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Verbose mode logs debug to the console; normal mode keeps the console
    // quiet so stdout stays reserved for attempt records and summaries
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("tdp".to_string())
        .build();

    // Environment variables take precedence
    let log_config = LogConfig::from_env_with(log_config.clone()).unwrap_or(log_config);

    // The CLI still works if logging cannot be initialized
    let _ = init_logging(&log_config);

    process::exit(execute_command(cli).await);
}

/// Execute the CLI command and map its result to a process exit code
async fn execute_command(cli: Cli) -> i32 {
    match cli.command {
        Commands::Fetch {
            dataset,
            year,
            month,
            from,
            to,
            raw_root,
        } => {
            let args = commands::fetch::FetchArgs {
                dataset,
                year,
                month,
                from,
                to,
                raw_root,
            };
            match commands::fetch::run(args).await {
                Ok(summary) if summary.failed == 0 => 0,
                Ok(summary) => {
                    error!(failed = summary.failed, "Fetch completed with failures");
                    eprintln!("Error: {} partition(s) failed", summary.failed);
                    EXIT_SOFT_FAILURE
                },
                Err(e) => {
                    error!(error = %e, "Fetch aborted");
                    eprintln!("Error: {}", e);
                    EXIT_FATAL
                },
            }
        },

        Commands::Ingest {
            dry_run,
            raw_root,
            db_path,
        } => match commands::ingest::run(dry_run, raw_root, db_path).await {
            Ok(_) => 0,
            Err(e) => {
                error!(error = %e, "Ingestion aborted");
                eprintln!("Error: {}", e);
                if let CliError::ChecksumCollision { .. } = e {
                    eprintln!("Data-integrity violation: the ledger was not modified for this path.");
                }
                EXIT_FATAL
            },
        },
    }
}
