//! Benchmark supervisor
//!
//! Allocates the progress table, fans out one reader task per source plus
//! one reporter task, waits for the readers, and applies the failure
//! policy. The reporter is stopped through its cancellation token once the
//! readers are done, so a run always terminates.

use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::bench::progress::ProgressTable;
use crate::bench::reader::SourceReader;
use crate::bench::reporter::{Reporter, TickReport};
use crate::config::{BenchConfig, FailurePolicy};
use crate::io::BackendRegistry;
use crate::models::{RunSummary, SourceOutcome};
use crate::{ReadBenchError, Result};

type ReaderOutput = (usize, Duration, Result<u64>);

/// Coordinates the readers and the reporter for one run
pub struct Supervisor {
    config: BenchConfig,
    registry: Arc<BackendRegistry>,
    tick_updates: Option<mpsc::Sender<TickReport>>,
}

impl Supervisor {
    /// Create a supervisor; the configuration is validated here
    pub fn new(config: BenchConfig, registry: Arc<BackendRegistry>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            tick_updates: None,
        })
    }

    /// Forward every reporter tick to `tx` as well as to the log
    ///
    /// For callers embedding the benchmark that want per-tick numbers
    /// rather than log lines; the CLI only logs.
    pub fn with_tick_updates(mut self, tx: mpsc::Sender<TickReport>) -> Self {
        self.tick_updates = Some(tx);
        self
    }

    /// Read every source to completion
    ///
    /// Under [`FailurePolicy::AbortAll`] the first failing source aborts all
    /// other readers and its error is returned. Under
    /// [`FailurePolicy::Isolate`] failures are recorded in the summary and
    /// the remaining sources run to completion.
    pub async fn run(&self, paths: Vec<String>) -> Result<RunSummary> {
        if paths.is_empty() {
            return Err(ReadBenchError::Config("No sources to read".to_string()));
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let (table, writers) = ProgressTable::new(paths);

        let cancel = CancellationToken::new();
        let reporter = self.spawn_reporter(&table, &cancel);

        let reader = SourceReader::new(
            Arc::clone(&self.registry),
            self.config.chunk_size as usize,
        );
        let mut readers: JoinSet<ReaderOutput> = JoinSet::new();
        for slot in writers {
            let reader = reader.clone();
            readers.spawn(async move {
                let began = Instant::now();
                let result = AssertUnwindSafe(reader.run(&slot))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        Err(ReadBenchError::Worker(format!(
                            "{}: reader panicked",
                            slot.path()
                        )))
                    });
                (slot.index(), began.elapsed(), result)
            });
        }
        debug!(sources = table.len(), "readers started");

        let mut outcomes: Vec<Option<SourceOutcome>> = vec![None; table.len()];
        let mut failure = None;
        while let Some(joined) = readers.join_next().await {
            let (index, elapsed, result) = match joined {
                Ok(output) => output,
                Err(e) => {
                    failure = Some(ReadBenchError::Worker(format!("Reader join failed: {}", e)));
                    readers.abort_all();
                    break;
                }
            };
            let path = table.path(index);

            match result {
                Ok(bytes) => outcomes[index] = Some(SourceOutcome::completed(path, bytes, elapsed)),
                Err(err) => match self.config.failure_policy {
                    FailurePolicy::AbortAll => {
                        debug!(remaining = readers.len(), "aborting readers");
                        readers.abort_all();
                        failure = Some(err);
                        break;
                    }
                    FailurePolicy::Isolate => {
                        error!("{}", err);
                        let bytes_read = table.snapshot()[index].bytes_read;
                        outcomes[index] = Some(SourceOutcome::failed(
                            path,
                            bytes_read,
                            elapsed,
                            err.to_string(),
                        ));
                    }
                },
            }
        }

        cancel.cancel();
        let reporter_ticks = match reporter {
            Some(handle) => handle.await.unwrap_or(0),
            None => 0,
        };

        if let Some(err) = failure {
            return Err(err);
        }

        let sources = outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                outcome.ok_or_else(|| {
                    ReadBenchError::Worker(format!("{}: reader produced no result", table.path(index)))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let summary = RunSummary::new(started_at, sources, start.elapsed(), reporter_ticks);
        info!("{}", summary.describe());
        Ok(summary)
    }

    fn spawn_reporter(
        &self,
        table: &Arc<ProgressTable>,
        cancel: &CancellationToken,
    ) -> Option<JoinHandle<u64>> {
        if !self.config.report {
            return None;
        }

        let mut reporter = Reporter::from_config(Arc::clone(table), &self.config);
        if let Some(tx) = &self.tick_updates {
            reporter = reporter.with_updates(tx.clone());
        }
        Some(tokio::spawn(reporter.run(cancel.child_token())))
    }
}
