//! In-memory target for probe and sweep tests

use std::io::{self, SeekFrom};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crate::bench::deadline::PhaseState;
use crate::io::disk::DirectFile;

#[derive(Debug, Default)]
pub struct IoCounters {
    writes: AtomicU64,
    reads: AtomicU64,
    seeks: AtomicU64,
    syncs: AtomicU64,
}

impl IoCounters {
    pub fn snapshot(&self) -> IoStats {
        IoStats {
            writes: self.writes.load(Ordering::SeqCst),
            reads: self.reads.load(Ordering::SeqCst),
            seeks: self.seeks.load(Ordering::SeqCst),
            syncs: self.syncs.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStats {
    pub writes: u64,
    pub reads: u64,
    pub seeks: u64,
    pub syncs: u64,
}

/// A target that tracks only its length and offset. Written bytes are
/// discarded.
pub struct MemoryTarget {
    len: u64,
    position: u64,
    write_limit: Option<u64>,
    failure: Option<io::ErrorKind>,
    counters: Arc<IoCounters>,
    stop_hook: Option<(Arc<PhaseState>, u64)>,
    transfers: u64,
}

impl MemoryTarget {
    pub fn new(len: u64) -> Self {
        Self {
            len,
            position: 0,
            write_limit: None,
            failure: None,
            counters: Arc::new(IoCounters::default()),
            stop_hook: None,
            transfers: 0,
        }
    }

    /// Writes past `limit` bytes come back short
    pub fn with_write_limit(mut self, limit: u64) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Every transfer fails with `kind`
    pub fn failing_with(mut self, kind: io::ErrorKind) -> Self {
        self.failure = Some(kind);
        self
    }

    /// Stop `state` once `limit` transfers have been issued
    pub fn stop_after(&mut self, state: Arc<PhaseState>, limit: u64) {
        self.stop_hook = Some((state, limit));
        self.transfers = 0;
    }

    pub fn counters(&self) -> Arc<IoCounters> {
        Arc::clone(&self.counters)
    }

    pub fn stats(&self) -> IoStats {
        self.counters.snapshot()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    fn transfer_done(&mut self) {
        self.transfers += 1;
        if let Some((state, limit)) = &self.stop_hook {
            if self.transfers >= *limit {
                state.stop();
            }
        }
    }

    fn check_failure(&self) -> io::Result<()> {
        match self.failure {
            Some(kind) => Err(io::Error::new(kind, "injected failure")),
            None => Ok(()),
        }
    }
}

impl DirectFile for MemoryTarget {
    fn write_direct(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let room = match self.write_limit {
            Some(limit) => limit.saturating_sub(self.position),
            None => u64::MAX,
        };
        let written = (buf.len() as u64).min(room);
        self.position += written;
        self.len = self.len.max(self.position);
        self.transfer_done();
        Ok(written as usize)
    }

    fn read_direct(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let read = (buf.len() as u64).min(self.len.saturating_sub(self.position));
        self.position += read;
        self.transfer_done();
        Ok(read as usize)
    }

    fn seek_direct(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.counters.seeks.fetch_add(1, Ordering::SeqCst);
        self.position = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::End(delta) => self.len.saturating_add_signed(delta),
            SeekFrom::Current(delta) => self.position.saturating_add_signed(delta),
        };
        Ok(self.position)
    }

    fn sync_all(&mut self) -> io::Result<()> {
        self.counters.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
