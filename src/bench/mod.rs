//! Benchmark engine module
//!
//! Contains the deadline-bounded probe loops and the block-size sweep
//! that drives them.

pub mod deadline;
pub mod probe;
pub mod sweep;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use deadline::{ArmedDeadline, DeadlineTimer, PhaseState, DEADLINE_CHECK_INTERVAL};
pub use probe::SequentialProbe;
pub use sweep::{BlockSizeSweep, SweepController};
