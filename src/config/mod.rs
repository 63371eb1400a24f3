//! Configuration management module
//!
//! Handles loading, saving, and validation of benchmark configuration.
//! Values come from defaults, then the TOML config file, then CLI flags.

use crate::{ReadBenchError, Result, APP_NAME, CONFIG_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod cli;
pub mod path_list;

/// Default bytes requested per read call (4 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;
/// Default reporter tick period
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);
/// Default inactivity before a source is reported as stuck
pub const DEFAULT_STALL_THRESHOLD: Duration = Duration::from_secs(20);

const MIN_CHUNK_SIZE: u64 = 4 * 1024;
const MAX_CHUNK_SIZE: u64 = 256 * 1024 * 1024;

/// Benchmark configuration structure containing all run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Bytes requested per read call
    pub chunk_size: u64,
    /// Reporter tick period
    #[serde(with = "duration_str")]
    pub report_interval: Duration,
    /// Inactivity before a source is reported as stuck
    #[serde(with = "duration_str")]
    pub stall_threshold: Duration,
    /// Whether to run the periodic reporter at all
    pub report: bool,
    /// What the supervisor does when one source fails
    pub failure_policy: FailurePolicy,
    /// Extra URI schemes served over HTTP from a fixed endpoint
    pub backends: Vec<BackendMapping>,
}

/// Supervisor behaviour on a failing source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failing source aborts the whole run
    #[default]
    AbortAll,
    /// Failing sources are recorded and the others run to completion
    Isolate,
}

/// Maps a URI scheme onto an HTTP endpoint, path-style
///
/// With `scheme = "s3"` and `endpoint = "http://minio:9000"`,
/// `s3://bucket/key` is fetched from `http://minio:9000/bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendMapping {
    pub scheme: String,
    pub endpoint: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            report_interval: DEFAULT_REPORT_INTERVAL,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
            report: true,
            failure_policy: FailurePolicy::AbortAll,
            backends: Vec::new(),
        }
    }
}

impl BenchConfig {
    /// Create a new benchmark configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ReadBenchError::Config(format!(
                "Chunk size must be between {} and {} bytes, got {}",
                MIN_CHUNK_SIZE, MAX_CHUNK_SIZE, self.chunk_size
            )));
        }

        if self.report_interval.is_zero() {
            return Err(ReadBenchError::Config(
                "Report interval must be greater than 0".to_string(),
            ));
        }

        if self.stall_threshold.is_zero() {
            return Err(ReadBenchError::Config(
                "Stall threshold must be greater than 0".to_string(),
            ));
        }

        for mapping in &self.backends {
            mapping.validate()?;
        }

        Ok(())
    }

    /// Set the chunk size for read calls
    pub fn with_chunk_size(mut self, size: u64) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the reporter tick period
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Set the stall threshold
    pub fn with_stall_threshold(mut self, threshold: Duration) -> Self {
        self.stall_threshold = threshold;
        self
    }

    /// Enable or disable the periodic reporter
    pub fn with_report(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    /// Set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Add a scheme to endpoint mapping
    pub fn with_backend(mut self, scheme: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.backends.push(BackendMapping {
            scheme: scheme.into(),
            endpoint: endpoint.into(),
        });
        self
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReadBenchError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ReadBenchError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the given path, creating parent directories
    ///
    /// Used by `--save-config` to persist the effective settings.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ReadBenchError::Config(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(path, content).map_err(|e| {
            ReadBenchError::Config(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/readbench/readbench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ReadBenchError::Config("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

impl BackendMapping {
    fn validate(&self) -> Result<()> {
        let scheme_ok = !self.scheme.is_empty()
            && self
                .scheme
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '+' || c == '-' || c == '.');
        if !scheme_ok {
            return Err(ReadBenchError::Config(format!(
                "Backend scheme must be non-empty lowercase ASCII: '{}'",
                self.scheme
            )));
        }

        let endpoint = url::Url::parse(&self.endpoint).map_err(|e| {
            ReadBenchError::Config(format!(
                "Invalid endpoint '{}' for scheme '{}': {}",
                self.endpoint, self.scheme, e
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ReadBenchError::Config(format!(
                "Endpoint for scheme '{}' must be http or https: {}",
                self.scheme, self.endpoint
            )));
        }

        Ok(())
    }
}

/// Durations as human-readable strings ("1s", "250ms") in the config file
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
