use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;
use std::slice;

use crate::{MammothError, Result};

/// Fixed-capacity I/O buffer aligned for direct I/O.
///
/// One instance backs every phase of a sweep. The memory is zeroed once when
/// it is allocated and never refilled afterwards, so callers must treat the
/// contents as unspecified: writes push whatever the previous read left
/// behind.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The buffer owns its allocation exclusively.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `capacity` bytes aligned to `alignment`
    pub fn new(capacity: usize, alignment: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MammothError::AllocationError(
                "Buffer capacity must be greater than 0".to_string(),
            ));
        }

        let layout = Layout::from_size_align(capacity, alignment).map_err(|e| {
            MammothError::AllocationError(format!(
                "invalid layout ({} bytes aligned to {}): {}",
                capacity, alignment, e
            ))
        })?;

        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| {
            MammothError::AllocationError(format!(
                "out of memory allocating {} bytes aligned to {}",
                capacity, alignment
            ))
        })?;

        Ok(Self { ptr, layout })
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Alignment of the start of the buffer
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// First `len` bytes, for writing out
    ///
    /// # Panics
    /// If `len` exceeds the capacity.
    pub fn block(&self, len: usize) -> &[u8] {
        assert!(len <= self.capacity(), "block of {} bytes exceeds buffer capacity", len);
        // SAFETY: ptr is valid for capacity initialised bytes.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), len) }
    }

    /// First `len` bytes, for reading into
    ///
    /// # Panics
    /// If `len` exceeds the capacity.
    pub fn block_mut(&mut self, len: usize) -> &mut [u8] {
        assert!(len <= self.capacity(), "block of {} bytes exceeds buffer capacity", len);
        // SAFETY: ptr is valid for capacity initialised bytes and uniquely borrowed.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), len) }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with this exact layout.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("capacity", &self.capacity())
            .field("alignment", &self.alignment())
            .finish()
    }
}
