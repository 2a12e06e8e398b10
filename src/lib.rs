//! mammothbench - sequential disk throughput sweep
//!
//! Measures direct-I/O write and read bandwidth of a file or block device
//! across a doubling sweep of block sizes, one deadline-bounded phase per
//! direction and size.

use std::fmt;
use std::path::PathBuf;

pub mod bench;
pub mod cli;
pub mod config;
pub mod io;
pub mod logging;
pub mod models;
pub mod report;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum MammothError {
    /// Aligned buffer could not be obtained
    AllocationError(String),
    /// Target could not be opened with the required flags
    TargetOpenError { path: PathBuf, source: std::io::Error },
    /// A write/read/seek/sync call failed
    IoError { op: &'static str, source: std::io::Error },
    /// A write moved fewer bytes than requested
    ShortWrite { expected: usize, written: usize },
    /// Configuration validation or parsing error
    ConfigError(String),
    /// Probe thread or deadline task did not complete
    TaskError(String),
}

impl MammothError {
    /// Wrap an I/O error with the name of the failing operation
    pub fn io(op: &'static str, source: std::io::Error) -> Self {
        MammothError::IoError { op, source }
    }
}

impl fmt::Display for MammothError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MammothError::AllocationError(msg) => write!(f, "allocation: {}", msg),
            MammothError::TargetOpenError { path, source } => {
                write!(f, "open {}: {}", path.display(), source)
            }
            MammothError::IoError { op, source } => write!(f, "{}: {}", op, source),
            MammothError::ShortWrite { expected, written } => write!(
                f,
                "write: short write ({} of {} bytes)",
                written, expected
            ),
            MammothError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            MammothError::TaskError(msg) => write!(f, "Benchmark task error: {}", msg),
        }
    }
}

impl std::error::Error for MammothError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MammothError::TargetOpenError { source, .. } => Some(source),
            MammothError::IoError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MammothError {
    fn from(err: std::io::Error) -> Self {
        MammothError::IoError { op: "io", source: err }
    }
}

impl From<toml::de::Error> for MammothError {
    fn from(err: toml::de::Error) -> Self {
        MammothError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<tokio::task::JoinError> for MammothError {
    fn from(err: tokio::task::JoinError) -> Self {
        MammothError::TaskError(err.to_string())
    }
}

/// Result type alias for mammothbench operations
pub type Result<T> = std::result::Result<T, MammothError>;

/// Error presentation helpers
pub mod error {
    use super::MammothError;

    /// Convert error to an operator hint, if one applies
    pub fn user_friendly_message(error: &MammothError) -> Option<String> {
        match error {
            MammothError::TargetOpenError { source, .. } => match source.raw_os_error() {
                #[cfg(unix)]
                Some(libc::EINVAL) => Some(
                    "The filesystem rejected direct I/O. Retry with --buffered to measure \
                     through the page cache."
                        .to_string(),
                ),
                #[cfg(unix)]
                Some(libc::EBUSY) => {
                    Some("The target is already open elsewhere (mounted?).".to_string())
                }
                #[cfg(unix)]
                Some(libc::EPERM) => Some(
                    "Opening without atime updates requires owning the target. \
                     Try running as root."
                        .to_string(),
                ),
                _ => match source.kind() {
                    std::io::ErrorKind::NotFound => {
                        Some("The target must already exist; it is never created.".to_string())
                    }
                    std::io::ErrorKind::PermissionDenied => Some(
                        "Permission denied. Check file permissions or run as root.".to_string(),
                    ),
                    _ => None,
                },
            },
            MammothError::IoError { source, .. } => match source.raw_os_error() {
                #[cfg(unix)]
                Some(libc::EINVAL) => Some(format!(
                    "Direct I/O needs block sizes aligned to the device sector size. \
                     Check -f/-t and --alignment (default {} bytes).",
                    super::DEFAULT_ALIGNMENT
                )),
                #[cfg(unix)]
                Some(libc::ENOSPC) => Some(
                    "The target filled up. Reduce the volume with -s or use a larger target."
                        .to_string(),
                ),
                _ => None,
            },
            MammothError::ShortWrite { .. } => Some(
                "The target ran out of space. Reduce the volume with -s or use a larger target."
                    .to_string(),
            ),
            MammothError::AllocationError(_) => {
                Some("Reduce the ending block size with -t.".to_string())
            }
            MammothError::ConfigError(_) | MammothError::TaskError(_) => None,
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "mammothbench";
pub const CONFIG_FILE: &str = "mammothbench.toml";
/// Minimum direct-I/O granularity assumed for targets
pub const DEFAULT_ALIGNMENT: usize = 512;
pub const MIB: u64 = 1024 * 1024;
