//! Periodic throughput and stall reporter
//!
//! Wakes once per interval, snapshots the progress table, and compares the
//! snapshot with the previous one. It only reads values that readers have
//! already published and never waits on a source.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bench::progress::{ProgressTable, Snapshot};
use crate::config::BenchConfig;
use crate::util::units::MIB;

/// A source with no read for longer than the stall threshold
#[derive(Debug, Clone, PartialEq)]
pub struct StalledSource {
    pub index: usize,
    pub path: String,
    pub stalled_for: Duration,
}

/// Result of one reporter tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Bytes read across all sources since the previous tick
    pub interval_bytes: u64,
    /// Measured wall-clock time since the previous tick
    pub interval: Duration,
    pub stalls: Vec<StalledSource>,
}

impl TickReport {
    /// Aggregate throughput over the interval, 0 for an empty interval
    pub fn bytes_per_sec(&self) -> f64 {
        if self.interval.is_zero() {
            return 0.0;
        }
        self.interval_bytes as f64 / self.interval.as_secs_f64()
    }

    pub fn mib_per_sec(&self) -> f64 {
        self.bytes_per_sec() / MIB
    }

    /// Write the tick's log lines
    pub fn emit(&self) {
        for stall in &self.stalls {
            warn!(
                "{}: stuck for {:.3}s",
                stall.path,
                stall.stalled_for.as_secs_f64()
            );
        }
        info!("throughput {:.3} MiB/s", self.mib_per_sec());
    }
}

/// Double-buffered snapshot comparator driven by a ticker
pub struct Reporter {
    table: Arc<ProgressTable>,
    interval: Duration,
    stall_threshold: Duration,
    previous: Snapshot,
    current: Snapshot,
    last_tick: Instant,
    updates: Option<mpsc::Sender<TickReport>>,
}

impl Reporter {
    /// Create a reporter whose first interval starts now
    pub fn new(table: Arc<ProgressTable>, interval: Duration, stall_threshold: Duration) -> Self {
        let previous = table.snapshot();
        let current = Snapshot::default();
        Self {
            table,
            interval,
            stall_threshold,
            previous,
            current,
            last_tick: Instant::now(),
            updates: None,
        }
    }

    pub fn from_config(table: Arc<ProgressTable>, config: &BenchConfig) -> Self {
        Self::new(table, config.report_interval, config.stall_threshold)
    }

    /// Also deliver every tick's report on `tx`; full or closed channels
    /// drop the report instead of delaying the reporter.
    ///
    /// Wired up through [`Supervisor::with_tick_updates`](crate::bench::Supervisor::with_tick_updates).
    pub fn with_updates(mut self, tx: mpsc::Sender<TickReport>) -> Self {
        self.updates = Some(tx);
        self
    }

    /// Compute one tick at instant `now` and rotate the snapshot buffers
    pub fn tick(&mut self, now: Instant) -> TickReport {
        self.table.snapshot_into(&mut self.current);
        let now_ts = self.table.timestamp(now);

        let stalls = self
            .current
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let idle = slot.idle_for(now_ts)?;
                (idle > self.stall_threshold).then(|| StalledSource {
                    index,
                    path: self.table.path(index).to_string(),
                    stalled_for: idle,
                })
            })
            .collect();

        let report = TickReport {
            interval_bytes: self.current.bytes_since(&self.previous),
            interval: now.saturating_duration_since(self.last_tick),
            stalls,
        };

        std::mem::swap(&mut self.previous, &mut self.current);
        self.last_tick = now;
        report
    }

    /// Tick every interval until `cancel` fires, returning the tick count.
    ///
    /// Cancellation is observed while waiting, so the loop ends within one
    /// tick of it.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        let mut ticker = interval_at(self.last_tick + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.tick(Instant::now());
                    debug!(
                        interval_bytes = report.interval_bytes,
                        interval_secs = report.interval.as_secs_f64(),
                        "reporter tick"
                    );
                    report.emit();
                    if let Some(tx) = &self.updates {
                        let _ = tx.try_send(report);
                    }
                    ticks += 1;
                }
            }
        }

        debug!(ticks, "reporter stopped");
        ticks
    }
}
