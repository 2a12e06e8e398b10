//! Block-size sweep
//!
//! Walks the doubling progression of block sizes and, for each one, runs
//! the write phase then the read phase against the same target and
//! buffer. Every phase starts from fresh counters; nothing carries over
//! between block sizes except the file offset.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use crate::bench::deadline::{DeadlineTimer, PhaseState};
use crate::bench::probe::SequentialProbe;
use crate::config::BenchmarkConfig;
use crate::io::buffer::AlignedBuffer;
use crate::io::disk::DirectFile;
use crate::models::{Direction, PhaseOutcome, ProbeResult, SweepRow};
use crate::report::Reporter;
use crate::util::units::format_bytes;
use crate::Result;

/// Doubling progression `from, 2*from, 4*from, ...` up to and including `to`
#[derive(Debug, Clone)]
pub struct BlockSizeSweep {
    next: Option<u64>,
    to: u64,
}

impl BlockSizeSweep {
    pub fn new(from: u64, to: u64) -> Self {
        let next = if from == 0 { None } else { Some(from) };
        Self { next, to }
    }
}

impl Iterator for BlockSizeSweep {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next.filter(|&size| size <= self.to)?;
        self.next = current.checked_mul(2);
        Some(current)
    }
}

/// Target and buffer, handed to the blocking thread for each phase
struct ProbeIo {
    target: Box<dyn DirectFile>,
    buffer: AlignedBuffer,
}

/// Top-level benchmark driver
pub struct SweepController {
    config: BenchmarkConfig,
    deadline: DeadlineTimer,
}

impl SweepController {
    /// Create a controller for a validated configuration
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        let deadline = DeadlineTimer::new(config.timeout);
        Ok(Self { config, deadline })
    }

    /// Check deadlines every `check_interval` instead of once a second
    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.deadline = DeadlineTimer::new(self.config.timeout).with_check_interval(check_interval);
        self
    }

    /// Run the whole sweep against `target`, streaming results to `reporter`
    pub async fn run<R>(&self, target: Box<dyn DirectFile>, reporter: &mut R) -> Result<()>
    where
        R: Reporter + ?Sized,
    {
        let capacity = self.config.to_block_size as usize;
        let buffer = AlignedBuffer::new(capacity, self.config.alignment as usize)?;
        info!(
            "Allocated {} I/O buffer aligned to {} bytes",
            format_bytes(capacity as u64),
            buffer.alignment()
        );

        let mut io = ProbeIo { target, buffer };
        reporter.begin(&self.config)?;

        for block_size in self.config.block_sizes() {
            reporter.block_started(block_size)?;

            let (next_io, write) = self.phase(io, Direction::Write, block_size).await?;
            reporter.phase_finished(Direction::Write, &write)?;

            let (next_io, read) = self.phase(next_io, Direction::Read, block_size).await?;
            reporter.phase_finished(Direction::Read, &read)?;
            io = next_io;

            reporter.row_finished(&SweepRow {
                block_size,
                write,
                read,
            })?;
        }

        reporter.finish()
    }

    fn enabled(&self, direction: Direction) -> bool {
        match direction {
            Direction::Write => self.config.write_enabled,
            Direction::Read => self.config.read_enabled,
        }
    }

    async fn phase(
        &self,
        io: ProbeIo,
        direction: Direction,
        block_size: u64,
    ) -> Result<(ProbeIo, PhaseOutcome)> {
        if !self.enabled(direction) {
            debug!(block_size, %direction, "phase skipped");
            return Ok((io, PhaseOutcome::Skipped));
        }

        let (io, result) = self.measure(io, SequentialProbe::for_direction(direction), block_size).await?;
        debug!(
            block_size,
            %direction,
            blocks = result.blocks_completed,
            bytes = result.bytes_processed(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "phase finished"
        );
        Ok((io, PhaseOutcome::Measured(result)))
    }

    async fn measure(
        &self,
        mut io: ProbeIo,
        probe: SequentialProbe,
        block_size: u64,
    ) -> Result<(ProbeIo, ProbeResult)> {
        let state = Arc::new(PhaseState::start(block_size));
        let deadline = self
            .deadline
            .arm(Arc::clone(&state), self.config.target_blocks(block_size));

        let loop_state = Arc::clone(&state);
        let (io, outcome) = tokio::task::spawn_blocking(move || {
            let block = io.buffer.block_mut(block_size as usize);
            let outcome = probe.run(io.target.as_mut(), block, &loop_state);
            (io, outcome)
        })
        .await?;

        // On error the deadline is dropped here, which cancels it.
        outcome?;
        let result = deadline.finish().await?;
        Ok((io, result))
    }
}
