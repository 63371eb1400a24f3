//! readbench - concurrent read-throughput benchmark
//!
//! Entry point for the CLI application.

use clap::Parser;
use readbench::bench::Supervisor;
use readbench::config::cli::CliArgs;
use readbench::config::path_list::load_path_list;
use readbench::config::BenchConfig;
use readbench::error::user_friendly_message;
use readbench::io::BackendRegistry;
use readbench::{ReadBenchError, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", user_friendly_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ReadBenchError::Worker(format!("Failed to create async runtime: {}", e)))?;

    let result = runtime.block_on(run_async(args));

    // Readers stuck in blocking filesystem calls must not hold the process open
    runtime.shutdown_background();
    result
}

async fn run_async(args: CliArgs) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => BenchConfig::load_from(path)?,
        None => BenchConfig::load()?,
    };
    let config = args.apply(file_config);
    config.validate()?;
    debug!(?config, "effective configuration");

    if args.save_config {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => BenchConfig::config_file_path()?,
        };
        config.save_to(&path)?;
        info!("configuration saved to {}", path.display());
    }

    // Unreadable or empty path lists fail before any reader starts
    let paths = load_path_list(&args.path_list)?;

    let registry = BackendRegistry::from_config(&config)?;
    debug!(schemes = ?registry.schemes(), "storage backends registered");

    let supervisor = Supervisor::new(config, Arc::new(registry))?;
    let summary = supervisor.run(paths).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| ReadBenchError::Worker(format!("Failed to encode summary: {}", e)))?;
        println!("{}", json);
    }

    summary.ensure_success()
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "readbench=debug,warn"
    } else {
        "readbench=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
