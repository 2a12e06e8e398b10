//! Utility functions module
//!
//! Contains throughput math and unit conversions shared by the
//! benchmark engine, the command line and the reporters.

pub mod units;

// Re-export commonly used functions
pub use units::{
    calculate_throughput_mbps, format_block_size_kb, format_bytes, format_throughput,
    kib_to_bytes, mib_to_bytes, parse_timeout,
};
