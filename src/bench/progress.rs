//! Lock-free per-source progress table
//!
//! Each source owns one slot. The owning reader is the only writer; the
//! reporter copies every slot out with plain atomic loads. There is no
//! global lock, so a snapshot is not linearisable across slots: each value
//! is at least as recent as the last write visible to the loading thread,
//! and may lag a concurrent write. That is fine for throughput reporting
//! and stall detection but not for exact sub-interval accounting.

use std::ops::Index;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One source's published progress
#[derive(Debug)]
struct ProgressSlot {
    path: String,
    /// Cumulative bytes read, only ever increased
    bytes_read: AtomicU64,
    /// Nanoseconds since the table origin of the latest read, 0 = none yet
    last_activity: AtomicU64,
}

/// Progress slots for every source of a run
#[derive(Debug)]
pub struct ProgressTable {
    origin: Instant,
    slots: Box<[ProgressSlot]>,
}

/// Exclusive write access to one slot
///
/// Handed out exactly once per slot by [`ProgressTable::new`] and not
/// `Clone`, so each slot has a single writer.
#[derive(Debug)]
pub struct SlotWriter {
    table: Arc<ProgressTable>,
    index: usize,
}

/// Copy of one slot's values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub bytes_read: u64,
    /// Table timestamp of the latest read, 0 if the source never read
    pub last_activity: u64,
}

/// Copy of every slot, reused between reporter ticks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    slots: Vec<SlotSnapshot>,
}

impl ProgressTable {
    /// Create a table with one zeroed slot per path, plus their writers
    pub fn new<I, S>(paths: I) -> (Arc<Self>, Vec<SlotWriter>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots: Box<[ProgressSlot]> = paths
            .into_iter()
            .map(|path| ProgressSlot {
                path: path.into(),
                bytes_read: AtomicU64::new(0),
                last_activity: AtomicU64::new(0),
            })
            .collect();

        let table = Arc::new(Self {
            origin: Instant::now(),
            slots,
        });
        let writers = (0..table.slots.len())
            .map(|index| SlotWriter {
                table: Arc::clone(&table),
                index,
            })
            .collect();

        (table, writers)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Source identifier of slot `index`
    pub fn path(&self, index: usize) -> &str {
        &self.slots[index].path
    }

    /// Table timestamp for an instant; never 0 so 0 can mean "no activity"
    pub fn timestamp(&self, at: Instant) -> u64 {
        let nanos = at.saturating_duration_since(self.origin).as_nanos();
        u64::try_from(nanos).unwrap_or(u64::MAX).max(1)
    }

    /// Table timestamp for the current instant
    pub fn now(&self) -> u64 {
        self.timestamp(Instant::now())
    }

    /// Copy every slot into `dst` without blocking writers
    pub fn snapshot_into(&self, dst: &mut Snapshot) {
        dst.slots.resize(self.slots.len(), SlotSnapshot::default());
        for (out, slot) in dst.slots.iter_mut().zip(self.slots.iter()) {
            out.bytes_read = slot.bytes_read.load(Ordering::Acquire);
            out.last_activity = slot.last_activity.load(Ordering::Acquire);
        }
    }

    /// Allocate and fill a new snapshot
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        self.snapshot_into(&mut snapshot);
        snapshot
    }
}

impl SlotWriter {
    /// Position of the owned slot in the table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &str {
        self.table.path(self.index)
    }

    /// Publish a completed read of `n` bytes (0 for end-of-data).
    ///
    /// The byte count is published before the timestamp, and both before
    /// the caller issues its next read.
    pub fn record(&self, n: usize) {
        let slot = &self.table.slots[self.index];
        slot.bytes_read.fetch_add(n as u64, Ordering::Release);
        slot.last_activity.fetch_max(self.table.now(), Ordering::Release);
    }

    /// Bytes published so far by this writer
    pub fn bytes_read(&self) -> u64 {
        self.table.slots[self.index].bytes_read.load(Ordering::Relaxed)
    }
}

impl SlotSnapshot {
    /// Whether the source has completed at least one read
    pub fn is_active(&self) -> bool {
        self.last_activity != 0
    }

    /// Time since the last read as of table timestamp `now`, `None` before
    /// the first read
    pub fn idle_for(&self, now: u64) -> Option<Duration> {
        self.is_active()
            .then(|| Duration::from_nanos(now.saturating_sub(self.last_activity)))
    }
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SlotSnapshot> {
        self.slots.iter()
    }

    /// Sum of `bytes_read` over all slots
    pub fn total_bytes(&self) -> u64 {
        self.slots.iter().map(|s| s.bytes_read).sum()
    }

    /// Bytes read since `previous`, summed over all slots
    pub fn bytes_since(&self, previous: &Snapshot) -> u64 {
        self.slots
            .iter()
            .zip(previous.slots.iter())
            .map(|(cur, prev)| cur.bytes_read.saturating_sub(prev.bytes_read))
            .sum()
    }
}

impl Index<usize> for Snapshot {
    type Output = SlotSnapshot;

    fn index(&self, index: usize) -> &SlotSnapshot {
        &self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    #[test]
    fn test_new_table_is_zeroed() {
        let (table, writers) = ProgressTable::new(["a", "b", "c"]);
        assert_eq!(table.len(), 3);
        assert_eq!(writers.len(), 3);
        assert_eq!(writers[1].index(), 1);
        assert_eq!(writers[2].path(), "c");

        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|s| *s == SlotSnapshot::default()));
        assert_eq!(snapshot[0].idle_for(table.now()), None);
    }

    #[test]
    fn test_record_updates_only_own_slot() {
        let (table, writers) = ProgressTable::new(["a", "b"]);
        writers[1].record(4096);
        writers[1].record(100);

        let snapshot = table.snapshot();
        assert_eq!(snapshot[0], SlotSnapshot::default());
        assert_eq!(snapshot[1].bytes_read, 4196);
        assert!(snapshot[1].is_active());
        assert_eq!(writers[1].bytes_read(), 4196);
    }

    #[test]
    fn test_zero_byte_read_marks_activity() {
        let (table, writers) = ProgressTable::new(["empty"]);
        writers[0].record(0);

        let snapshot = table.snapshot();
        assert_eq!(snapshot[0].bytes_read, 0);
        assert!(snapshot[0].is_active());
    }

    #[test]
    fn test_snapshot_into_resizes_buffer() {
        let (table, writers) = ProgressTable::new(["a", "b"]);
        writers[0].record(10);

        let mut buf = Snapshot::default();
        table.snapshot_into(&mut buf);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.total_bytes(), 10);
    }

    #[test]
    fn test_bytes_since() {
        let (table, writers) = ProgressTable::new(["a", "b"]);
        writers[0].record(100);
        let previous = table.snapshot();
        writers[0].record(50);
        writers[1].record(25);
        let current = table.snapshot();

        assert_eq!(current.bytes_since(&previous), 75);
        assert_eq!(current.bytes_since(&current), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timestamps_follow_clock() {
        let (table, writers) = ProgressTable::new(["a"]);
        tokio::time::advance(Duration::from_secs(3)).await;
        writers[0].record(1);

        let snapshot = table.snapshot();
        assert_eq!(snapshot[0].last_activity, Duration::from_secs(3).as_nanos() as u64);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(snapshot[0].idle_for(table.now()), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_slots_monotonic_under_concurrent_snapshots() {
        let (table, writers) = ProgressTable::new((0..4).map(|i| format!("src-{}", i)));
        let done = Arc::new(AtomicBool::new(false));

        let observers: Vec<_> = (0..2)
            .map(|_| {
                let table = Arc::clone(&table);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut previous = table.snapshot();
                    let mut current = Snapshot::default();
                    while !done.load(Ordering::Acquire) {
                        table.snapshot_into(&mut current);
                        for (cur, prev) in current.iter().zip(previous.iter()) {
                            assert!(cur.bytes_read >= prev.bytes_read);
                            assert!(cur.last_activity >= prev.last_activity);
                        }
                        std::mem::swap(&mut previous, &mut current);
                    }
                })
            })
            .collect();

        let producers: Vec<_> = writers
            .into_iter()
            .map(|writer| {
                thread::spawn(move || {
                    for i in 0..20_000usize {
                        writer.record(i % 7);
                    }
                    writer.bytes_read()
                })
            })
            .collect();

        let expected: u64 = (0..20_000u64).map(|i| i % 7).sum();
        for producer in producers {
            assert_eq!(producer.join().unwrap(), expected);
        }
        done.store(true, Ordering::Release);
        for observer in observers {
            observer.join().unwrap();
        }

        assert_eq!(table.snapshot().total_bytes(), expected * 4);
    }
}
