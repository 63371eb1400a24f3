//! Run result data models
//!
//! Per-source outcomes and whole-run totals, serialisable for `--json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::util::units::{calculate_throughput_mibps, format_bytes, format_throughput};
use crate::{ReadBenchError, Result};

/// How one source's reader ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Completed,
    Failed { error: String },
}

/// Final state of one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub path: String,
    /// Bytes read; the full length for completed sources
    pub bytes_read: u64,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// Summary of a whole benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run started
    pub timestamp: DateTime<Utc>,
    /// Outcomes in path-list order
    pub sources: Vec<SourceOutcome>,
    pub total_bytes: u64,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Average throughput over the whole run in MiB/s
    pub throughput_mibps: f64,
    /// Number of reporter ticks, 0 when the reporter was disabled
    pub reporter_ticks: u64,
}

impl SourceOutcome {
    pub fn completed(path: impl Into<String>, bytes_read: u64, elapsed: Duration) -> Self {
        Self {
            path: path.into(),
            bytes_read,
            elapsed,
            status: SourceStatus::Completed,
        }
    }

    pub fn failed(
        path: impl Into<String>,
        bytes_read: u64,
        elapsed: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            bytes_read,
            elapsed,
            status: SourceStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, SourceStatus::Completed)
    }
}

impl RunSummary {
    /// Build a summary, deriving totals from the outcomes
    pub fn new(
        timestamp: DateTime<Utc>,
        sources: Vec<SourceOutcome>,
        elapsed: Duration,
        reporter_ticks: u64,
    ) -> Self {
        let total_bytes = sources.iter().map(|s| s.bytes_read).sum();
        Self {
            timestamp,
            sources,
            total_bytes,
            elapsed,
            throughput_mibps: calculate_throughput_mibps(total_bytes, elapsed),
            reporter_ticks,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_completed()).count()
    }

    /// Error if any source failed
    pub fn ensure_success(&self) -> Result<()> {
        match self.failed_count() {
            0 => Ok(()),
            failed => Err(ReadBenchError::Sources {
                failed,
                total: self.sources.len(),
            }),
        }
    }

    /// One-line human summary
    pub fn describe(&self) -> String {
        format!(
            "{} sources, {} in {:.2}s ({} average)",
            self.sources.len(),
            format_bytes(self.total_bytes),
            self.elapsed.as_secs_f64(),
            format_throughput(self.throughput_mibps)
        )
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
