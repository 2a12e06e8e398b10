//! Benchmark result data models
//!
//! Per-phase measurements and the per-block-size rows built from them.

use crate::util::units::{calculate_throughput_mbps, MIN_ELAPSED};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Direction of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Write,
    Read,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Write => f.write_str("write"),
            Direction::Read => f.write_str("read"),
        }
    }
}

/// Measurement of one completed phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    /// Bytes per I/O call
    pub block_size: u64,
    /// I/O calls completed when the deadline fired
    pub blocks_completed: u64,
    /// Wall-clock time from phase start to the deadline firing
    #[serde(rename = "elapsed_secs", with = "duration_secs")]
    pub elapsed: Duration,
    /// Average throughput in MB/s (MiB per second)
    pub throughput_mbps: f64,
}

impl ProbeResult {
    /// Build a result and derive its throughput
    pub fn new(block_size: u64, blocks_completed: u64, elapsed: Duration) -> Self {
        let elapsed = elapsed.max(MIN_ELAPSED);
        Self {
            block_size,
            blocks_completed,
            elapsed,
            throughput_mbps: calculate_throughput_mbps(block_size, blocks_completed, elapsed),
        }
    }

    /// Total bytes moved during the phase
    pub fn bytes_processed(&self) -> u64 {
        self.block_size.saturating_mul(self.blocks_completed)
    }

    /// Check the stored throughput against the raw counters
    pub fn validate_throughput(&self) -> bool {
        let expected =
            calculate_throughput_mbps(self.block_size, self.blocks_completed, self.elapsed);
        if expected == 0.0 {
            return self.throughput_mbps == 0.0;
        }
        ((self.throughput_mbps - expected) / expected).abs() < 1e-9
    }
}

/// What happened in one direction at one block size
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    Measured(ProbeResult),
    /// Phase disabled by configuration; no I/O was issued
    Skipped,
}

impl PhaseOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, PhaseOutcome::Skipped)
    }

    pub fn throughput_mbps(&self) -> Option<f64> {
        match self {
            PhaseOutcome::Measured(result) => Some(result.throughput_mbps),
            PhaseOutcome::Skipped => None,
        }
    }

    pub fn result(&self) -> Option<&ProbeResult> {
        match self {
            PhaseOutcome::Measured(result) => Some(result),
            PhaseOutcome::Skipped => None,
        }
    }
}

impl Serialize for PhaseOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PhaseOutcome::Measured(result) => result.serialize(serializer),
            PhaseOutcome::Skipped => serializer.serialize_str("skip"),
        }
    }
}

/// One line of the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub block_size: u64,
    pub write: PhaseOutcome,
    pub read: PhaseOutcome,
}

pub(crate) mod duration_secs {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }
}
