//! readbench - concurrent read-throughput benchmark
//!
//! Reads every source in a path list to completion in parallel and reports
//! live aggregate throughput plus per-source stall warnings.

pub mod bench;
pub mod config;
pub mod io;
pub mod models;
pub mod util;

use thiserror::Error;

/// Common error type for readbench operations
#[derive(Debug, Error)]
pub enum ReadBenchError {
    /// I/O operation failed outside of a specific source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration validation or parsing error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The storage backend could not open a source
    #[error("{path}: open failed: {error}")]
    Open {
        path: String,
        #[source]
        error: std::io::Error,
    },

    /// A non end-of-data failure in the middle of a source
    #[error("{path}: read failed at byte {offset}: {error}")]
    Read {
        path: String,
        offset: u64,
        #[source]
        error: std::io::Error,
    },

    /// No backend is registered for the source's URI scheme
    #[error("{path}: no storage backend registered for scheme '{scheme}'")]
    UnknownScheme { scheme: String, path: String },

    /// A reader task panicked or was cancelled by the runtime
    #[error("Worker error: {0}")]
    Worker(String),

    /// One or more sources failed while running with failure isolation
    #[error("{failed} of {total} sources failed")]
    Sources { failed: usize, total: usize },
}

impl From<toml::de::Error> for ReadBenchError {
    fn from(err: toml::de::Error) -> Self {
        ReadBenchError::Config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for ReadBenchError {
    fn from(err: toml::ser::Error) -> Self {
        ReadBenchError::Config(format!("TOML serialization error: {}", err))
    }
}

impl ReadBenchError {
    /// The source this error is attributed to, if any
    pub fn source_path(&self) -> Option<&str> {
        match self {
            ReadBenchError::Open { path, .. }
            | ReadBenchError::Read { path, .. }
            | ReadBenchError::UnknownScheme { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for readbench operations
pub type Result<T> = std::result::Result<T, ReadBenchError>;

/// Error handling utilities
pub mod error {
    use super::ReadBenchError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &ReadBenchError) -> String {
        match error {
            ReadBenchError::Open { path, error } | ReadBenchError::Read { path, error, .. } => {
                match error.kind() {
                    std::io::ErrorKind::NotFound => {
                        format!("{}: source not found. Check the path list.", path)
                    }
                    std::io::ErrorKind::PermissionDenied => {
                        format!("{}: permission denied. Check credentials or file permissions.", path)
                    }
                    _ => format!("{}: {}", path, error),
                }
            }
            ReadBenchError::UnknownScheme { scheme, path } => format!(
                "{}: unsupported scheme '{}'. Map it to an endpoint with a [[backends]] entry in the config file.",
                path, scheme
            ),
            ReadBenchError::Config(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            _ => error.to_string(),
        }
    }

}

// Common types and constants
pub const APP_NAME: &str = "readbench";
pub const CONFIG_FILE: &str = "readbench.toml";
