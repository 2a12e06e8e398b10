//! Phase deadline
//!
//! A probe loop never looks at the clock. A background tokio task wakes
//! once per check interval, compares the blocks completed so far with the
//! phase target and the elapsed time with the timeout, and raises the stop
//! flag when either bound is hit. The loop polls that flag after each I/O
//! call.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use crate::models::ProbeResult;
use crate::{MammothError, Result};

/// Interval between deadline checks
pub const DEADLINE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// State shared between a probe loop and its deadline task
#[derive(Debug)]
pub struct PhaseState {
    block_size: u64,
    started_at: Instant,
    blocks_completed: AtomicU64,
    stopped: AtomicBool,
}

impl PhaseState {
    /// Start a phase now
    pub fn start(block_size: u64) -> Self {
        Self {
            block_size,
            started_at: Instant::now(),
            blocks_completed: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Count one completed I/O call
    pub fn record_block(&self) {
        self.blocks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn blocks_completed(&self) -> u64 {
        self.blocks_completed.load(Ordering::Relaxed)
    }

    /// Ask the probe loop to finish after its current call
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Decides when a phase ends
#[derive(Debug, Clone)]
pub struct DeadlineTimer {
    timeout: Duration,
    check_interval: Duration,
}

impl DeadlineTimer {
    /// Deadline with the standard one second check interval
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            check_interval: DEADLINE_CHECK_INTERVAL,
        }
    }

    /// Override the check interval
    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    /// A phase keeps running only while it is short of its block target
    /// and still inside the timeout
    pub fn should_stop(&self, blocks_completed: u64, target_blocks: u64, elapsed: Duration) -> bool {
        !(blocks_completed < target_blocks && elapsed < self.timeout)
    }

    /// Start checking `state` every interval. Must be called from within a
    /// tokio runtime.
    pub fn arm(&self, state: Arc<PhaseState>, target_blocks: u64) -> ArmedDeadline {
        let timer = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(timer.check_interval).await;

                let blocks = state.blocks_completed();
                let elapsed = state.elapsed();
                if !timer.should_stop(blocks, target_blocks, elapsed) {
                    continue;
                }

                let result = ProbeResult::new(state.block_size(), blocks, elapsed);
                state.stop();
                return result;
            }
        });

        ArmedDeadline {
            handle: Some(handle),
        }
    }
}

/// A running deadline task. Dropping it cancels the task.
#[derive(Debug)]
pub struct ArmedDeadline {
    handle: Option<JoinHandle<ProbeResult>>,
}

impl ArmedDeadline {
    /// Wait for the deadline to fire and return the phase measurement
    pub async fn finish(mut self) -> Result<ProbeResult> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| MammothError::TaskError("deadline already consumed".to_string()))?;
        Ok(handle.await?)
    }
}

impl Drop for ArmedDeadline {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_stop_on_target_or_timeout() {
        let timer = DeadlineTimer::new(Duration::from_secs(5));

        assert!(!timer.should_stop(10, 100, Duration::from_secs(1)));
        assert!(timer.should_stop(100, 100, Duration::from_secs(1)));
        assert!(timer.should_stop(150, 100, Duration::from_secs(1)));
        assert!(timer.should_stop(10, 100, Duration::from_secs(5)));
        assert!(timer.should_stop(10, 100, Duration::from_secs(6)));
        assert!(timer.should_stop(0, 0, Duration::ZERO));
    }

    #[test]
    fn test_phase_state_counters() {
        let state = PhaseState::start(4096);
        assert_eq!(state.block_size(), 4096);
        assert_eq!(state.blocks_completed(), 0);
        assert!(!state.is_stopped());

        state.record_block();
        state.record_block();
        state.stop();
        assert_eq!(state.blocks_completed(), 2);
        assert!(state.is_stopped());
    }

    #[tokio::test]
    async fn test_deadline_stops_when_target_reached() {
        let timer = DeadlineTimer::new(Duration::from_secs(30))
            .with_check_interval(Duration::from_millis(20));
        let state = Arc::new(PhaseState::start(512));
        for _ in 0..8 {
            state.record_block();
        }

        let result = timer.arm(Arc::clone(&state), 8).finish().await.unwrap();
        assert!(state.is_stopped());
        assert_eq!(result.block_size, 512);
        assert_eq!(result.blocks_completed, 8);
        assert!(result.elapsed >= Duration::from_millis(20));
        assert!(result.validate_throughput());
    }

    #[tokio::test]
    async fn test_deadline_stops_on_timeout_with_partial_count() {
        let timer = DeadlineTimer::new(Duration::from_millis(100))
            .with_check_interval(Duration::from_millis(20));
        let state = Arc::new(PhaseState::start(4096));
        state.record_block();

        let result = timer.arm(Arc::clone(&state), 1_000_000).finish().await.unwrap();
        assert!(state.is_stopped());
        assert_eq!(result.blocks_completed, 1);
        assert!(result.elapsed >= Duration::from_millis(100));
        assert!(result.throughput_mbps.is_finite() && result.throughput_mbps > 0.0);
    }

    #[tokio::test]
    async fn test_default_interval_never_fires_early() {
        let timer = DeadlineTimer::new(Duration::from_millis(1));
        let state = Arc::new(PhaseState::start(512));

        let result = timer.arm(Arc::clone(&state), 0).finish().await.unwrap();
        assert!(result.elapsed >= DEADLINE_CHECK_INTERVAL);
    }

    #[tokio::test]
    async fn test_dropping_armed_deadline_cancels_it() {
        let timer = DeadlineTimer::new(Duration::from_millis(1))
            .with_check_interval(Duration::from_millis(10));
        let state = Arc::new(PhaseState::start(512));

        drop(timer.arm(Arc::clone(&state), 0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!state.is_stopped());
    }
}
