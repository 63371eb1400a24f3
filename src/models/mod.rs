//! Data models module
//!
//! Contains the per-source outcome and run summary structures.

pub mod result;

// Re-export commonly used types
pub use result::{RunSummary, SourceOutcome, SourceStatus};
