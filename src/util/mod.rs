//! Utility functions module
//!
//! Contains helpers for units formatting, size and duration parsing.

pub mod units;

// Re-export commonly used functions
pub use units::{
    calculate_throughput_mibps, format_bytes, format_throughput, parse_bytes, parse_duration,
};
