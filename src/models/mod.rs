//! Data models module
//!
//! Contains per-phase results and the rows reported for each block size.

pub mod result;

// Re-export commonly used types
pub use result::{Direction, PhaseOutcome, ProbeResult, SweepRow};
