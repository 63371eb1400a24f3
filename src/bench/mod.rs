//! Benchmark engine module
//!
//! Contains the shared progress table, the per-source reader, the periodic
//! reporter, and the supervisor that ties them together.

pub mod progress;
pub mod reader;
pub mod reporter;
pub mod supervisor;

// Re-export commonly used types
pub use progress::{ProgressTable, SlotSnapshot, SlotWriter, Snapshot};
pub use reader::SourceReader;
pub use reporter::{Reporter, StalledSource, TickReport};
pub use supervisor::Supervisor;
