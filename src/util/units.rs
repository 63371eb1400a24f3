//! Units formatting and conversion utilities
//!
//! Human-readable sizes and durations for the CLI and config file, and the
//! throughput arithmetic shared by the reporter and the run summary.

use byte_unit::{Byte, Unit, UnitType};
use std::time::Duration;

/// Bytes in one MiB, the unit throughput is reported in
pub const MIB: f64 = 1_048_576.0;

/// Format bytes into human-readable size with appropriate units
///
/// # Examples
/// ```
/// use readbench::util::units::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.0 KiB");
/// assert_eq!(format_bytes(1048576), "1.0 MiB");
/// assert_eq!(format_bytes(1073741824), "1.0 GiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    match adjusted.get_unit() {
        Unit::B => format!("{} B", bytes),
        unit => format!("{:.1} {}", adjusted.get_value(), unit),
    }
}

/// Parse human-readable size string into bytes
///
/// Accepts decimal (KB, MB, GB) and binary (KiB, MiB, GiB) units,
/// case-insensitively; a bare number is a byte count.
///
/// # Examples
/// ```
/// use readbench::util::units::parse_bytes;
///
/// assert_eq!(parse_bytes("1 KiB").unwrap(), 1024);
/// assert_eq!(parse_bytes("4MiB").unwrap(), 4 * 1024 * 1024);
/// assert_eq!(parse_bytes("2 GB").unwrap(), 2_000_000_000);
/// ```
pub fn parse_bytes(input: &str) -> Result<u64, String> {
    let input = input.trim();
    if input.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    Byte::parse_str(input, true)
        .map(|b| b.as_u64())
        .map_err(|e| format!("Invalid size '{}': {}", input, e))
}

/// Parse duration string into Duration
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use readbench::util::units::parse_duration;
///
/// assert_eq!(parse_duration("20s").unwrap(), Duration::from_secs(20));
/// assert_eq!(parse_duration("1m 30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    humantime::parse_duration(input.trim()).map_err(|e| format!("Invalid duration '{}': {}", input, e))
}

/// Throughput in MiB/s from bytes and duration
///
/// Returns 0.0 for a zero duration rather than infinity.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use readbench::util::units::calculate_throughput_mibps;
///
/// let throughput = calculate_throughput_mibps(1048576, Duration::from_secs(1));
/// assert!((throughput - 1.0).abs() < 0.01);
/// ```
pub fn calculate_throughput_mibps(bytes: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }

    bytes as f64 / MIB / duration.as_secs_f64()
}

/// Format throughput value with appropriate units
///
/// # Examples
/// ```
/// use readbench::util::units::format_throughput;
///
/// assert_eq!(format_throughput(1024.0), "1.0 GiB/s");
/// assert_eq!(format_throughput(1.5), "1.5 MiB/s");
/// ```
pub fn format_throughput(mibps: f64) -> String {
    if mibps >= 1024.0 {
        format!("{:.1} GiB/s", mibps / 1024.0)
    } else if mibps >= 1.0 {
        format!("{:.1} MiB/s", mibps)
    } else if mibps >= 0.001 {
        format!("{:.1} KiB/s", mibps * 1024.0)
    } else {
        format!("{:.3} MiB/s", mibps)
    }
}
