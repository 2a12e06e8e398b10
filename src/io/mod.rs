//! I/O operations module
//!
//! Aligned buffers and the platform-specific target open used by the
//! probes.

pub mod buffer;
pub mod disk;

pub use buffer::AlignedBuffer;
pub use disk::{create_disk_io, DirectFile, DiskIO, PlatformDirectFile, PlatformDiskIO};
