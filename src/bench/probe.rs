//! Sequential probe loops
//!
//! Each loop issues back-to-back full-block calls against the target until
//! the phase deadline raises the stop flag. Both run synchronously and are
//! meant for a blocking thread.

use std::io::SeekFrom;
use crate::bench::deadline::PhaseState;
use crate::io::disk::DirectFile;
use crate::models::Direction;
use crate::{MammothError, Result};

/// One direction of sequential I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequentialProbe {
    /// Append blocks, then rewind and sync
    Write,
    /// Read blocks, wrapping to the start at end of target
    Read,
}

impl SequentialProbe {
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Write => SequentialProbe::Write,
            Direction::Read => SequentialProbe::Read,
        }
    }

    /// Run until `state` is stopped, using `block` as the transfer buffer
    pub fn run(&self, target: &mut dyn DirectFile, block: &mut [u8], state: &PhaseState) -> Result<()> {
        match self {
            SequentialProbe::Write => write_loop(target, block, state),
            SequentialProbe::Read => read_loop(target, block, state),
        }
    }
}

fn write_loop(target: &mut dyn DirectFile, block: &[u8], state: &PhaseState) -> Result<()> {
    while !state.is_stopped() {
        let written = target
            .write_direct(block)
            .map_err(|e| MammothError::io("write", e))?;
        if written != block.len() {
            return Err(MammothError::ShortWrite {
                expected: block.len(),
                written,
            });
        }
        state.record_block();
    }

    // Leave the offset at the start for the read phase and make the
    // written data durable before it begins.
    target
        .seek_direct(SeekFrom::Start(0))
        .map_err(|e| MammothError::io("lseek", e))?;
    target.sync_all().map_err(|e| MammothError::io("fsync", e))?;
    Ok(())
}

fn read_loop(target: &mut dyn DirectFile, block: &mut [u8], state: &PhaseState) -> Result<()> {
    while !state.is_stopped() {
        let read = target
            .read_direct(block)
            .map_err(|e| MammothError::io("read", e))?;
        if read == 0 {
            target
                .seek_direct(SeekFrom::Start(0))
                .map_err(|e| MammothError::io("lseek", e))?;
        }
        // The end-of-target attempt counts too.
        state.record_block();
    }
    Ok(())
}
