//! Units formatting and conversion utilities
//!
//! Throughput math plus the KiB/MiB/seconds conversions used by the
//! command line and the results table.

use std::time::Duration;

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Shortest duration a phase is treated as having taken
pub const MIN_ELAPSED: Duration = Duration::from_nanos(1);

/// Calculate throughput in MB/s (MiB per second) for a run of fixed-size blocks
///
/// A zero `elapsed` is clamped to [`MIN_ELAPSED`] so the result stays finite.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use mammothbench::util::units::calculate_throughput_mbps;
///
/// let throughput = calculate_throughput_mbps(4096, 256, Duration::from_secs(1));
/// assert!((throughput - 1.0).abs() < 1e-9);
/// ```
pub fn calculate_throughput_mbps(block_size: u64, blocks_completed: u64, elapsed: Duration) -> f64 {
    let elapsed = elapsed.max(MIN_ELAPSED);
    let megabytes = (block_size as f64) * (blocks_completed as f64) / BYTES_PER_MIB;
    megabytes / elapsed.as_secs_f64()
}

/// Convert a kilobyte count from the command line (fractions allowed) into bytes
///
/// # Examples
/// ```
/// use mammothbench::util::units::kib_to_bytes;
///
/// assert_eq!(kib_to_bytes(0.5).unwrap(), 512);
/// assert_eq!(kib_to_bytes(8192.0).unwrap(), 8 * 1024 * 1024);
/// ```
pub fn kib_to_bytes(kib: f64) -> Result<u64, String> {
    if !kib.is_finite() || kib <= 0.0 {
        return Err(format!("Block size must be a positive number of kilobytes: {}", kib));
    }
    let bytes = kib * 1024.0;
    if bytes.fract() != 0.0 {
        return Err(format!("{} KB is not a whole number of bytes", kib));
    }
    if bytes > u64::MAX as f64 {
        return Err(format!("{} KB is too large", kib));
    }
    Ok(bytes as u64)
}

/// Convert a megabyte count into bytes
pub fn mib_to_bytes(mib: u64) -> Result<u64, String> {
    mib.checked_mul(1024 * 1024)
        .ok_or_else(|| format!("{} MB is too large", mib))
}

/// Parse a phase timeout: a bare number is seconds, anything else is a
/// humantime duration such as `1m 30s`
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use mammothbench::util::units::parse_timeout;
///
/// assert_eq!(parse_timeout("5").unwrap(), Duration::from_secs(5));
/// assert_eq!(parse_timeout("1m30s").unwrap(), Duration::from_secs(90));
/// ```
pub fn parse_timeout(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<f64>() {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(format!("Timeout must be positive: {}", input));
        }
        return Duration::try_from_secs_f64(secs)
            .map_err(|e| format!("Invalid timeout '{}': {}", input, e));
    }
    humantime::parse_duration(input).map_err(|e| format!("Invalid timeout '{}': {}", input, e))
}

/// Format a block size for the BLKSIZE column: one decimal below 1 KiB,
/// whole kilobytes otherwise
pub fn format_block_size_kb(block_size: u64) -> String {
    if block_size < 1024 {
        format!("{:4.1}", block_size as f64 / 1024.0)
    } else {
        format!("{:4}", block_size / 1024)
    }
}

/// Format a throughput cell
pub fn format_throughput(mbps: f64) -> String {
    format!("{:5.1}", mbps)
}

/// Format bytes into human-readable size with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    const THRESHOLD: f64 = 1024.0;

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
