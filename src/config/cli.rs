//! Command-line arguments
//!
//! Flags override values from the config file, which override defaults.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use super::{BenchConfig, FailurePolicy};
use crate::util::units::{parse_bytes, parse_duration};

/// Concurrent read-throughput benchmark
#[derive(Parser, Debug, Clone)]
#[command(name = "readbench", version, about)]
pub struct CliArgs {
    /// Text file listing one source per line (local path or URI)
    #[arg(value_name = "PATH_LIST")]
    pub path_list: PathBuf,

    /// Bytes requested per read call, e.g. "4 MiB"
    #[arg(short = 'c', long, value_name = "SIZE", value_parser = parse_bytes)]
    pub chunk_size: Option<u64>,

    /// Reporter tick period, e.g. "1s"
    #[arg(short = 'i', long, value_name = "DUR", value_parser = parse_duration)]
    pub report_interval: Option<Duration>,

    /// Inactivity before a source is reported as stuck, e.g. "20s"
    #[arg(short = 's', long, value_name = "DUR", value_parser = parse_duration)]
    pub stall_threshold: Option<Duration>,

    /// TOML config file (default: user config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the effective configuration to the config file before running
    #[arg(long)]
    pub save_config: bool,

    /// Run without the periodic reporter
    #[arg(long)]
    pub no_report: bool,

    /// Record failing sources and keep reading the others
    #[arg(long)]
    pub isolate_failures: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Apply the flags that were given on top of `config`
    pub fn apply(&self, mut config: BenchConfig) -> BenchConfig {
        if let Some(size) = self.chunk_size {
            config = config.with_chunk_size(size);
        }
        if let Some(interval) = self.report_interval {
            config = config.with_report_interval(interval);
        }
        if let Some(threshold) = self.stall_threshold {
            config = config.with_stall_threshold(threshold);
        }
        if self.no_report {
            config = config.with_report(false);
        }
        if self.isolate_failures {
            config = config.with_failure_policy(FailurePolicy::Isolate);
        }
        config
    }
}
