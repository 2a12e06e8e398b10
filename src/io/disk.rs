use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Opens storage targets for benchmarking
pub trait DiskIO {
    /// Open an existing file or block device for read/write probing.
    ///
    /// The target is never created or truncated.
    fn open_target(&self, path: &Path) -> io::Result<Box<dyn DirectFile>>;
}

/// Unbuffered file operations used by the probes
pub trait DirectFile: Send {
    /// Write one block at the current offset
    fn write_direct(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Read one block at the current offset, returning 0 at end of target
    fn read_direct(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Seek to position
    fn seek_direct(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Force synchronization to stable storage
    fn sync_all(&mut self) -> io::Result<()>;
}

/// Platform-specific target opener
#[derive(Debug, Clone)]
pub struct PlatformDiskIO {
    direct_io: bool,
}

impl PlatformDiskIO {
    /// Opener that bypasses the page cache
    pub fn new() -> Self {
        Self { direct_io: true }
    }

    /// Opener that goes through the page cache (for filesystems without O_DIRECT)
    pub fn buffered() -> Self {
        Self { direct_io: false }
    }

    /// Choose between direct and buffered I/O
    pub fn with_direct_io(direct_io: bool) -> Self {
        Self { direct_io }
    }
}

impl Default for PlatformDiskIO {
    fn default() -> Self {
        Self::new()
    }
}

/// A target backed by a plain `File`
pub struct PlatformDirectFile {
    file: File,
}

impl PlatformDirectFile {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl DirectFile for PlatformDirectFile {
    fn write_direct(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn read_direct(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn seek_direct(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn sync_all(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use std::os::unix::fs::OpenOptionsExt;

    #[cfg(target_os = "linux")]
    fn open_flags(direct_io: bool) -> i32 {
        let flags = libc::O_EXCL | libc::O_NOATIME;
        if direct_io {
            flags | libc::O_DIRECT
        } else {
            flags
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn open_flags(_direct_io: bool) -> i32 {
        0
    }

    #[cfg(target_os = "macos")]
    fn disable_cache(file: &File) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        // SAFETY: fcntl on a descriptor we own.
        let ret = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_NOCACHE, 1) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(target_os = "macos"))]
    fn disable_cache(_file: &File) -> io::Result<()> {
        Ok(())
    }

    impl DiskIO for PlatformDiskIO {
        fn open_target(&self, path: &Path) -> io::Result<Box<dyn DirectFile>> {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .custom_flags(open_flags(self.direct_io))
                .open(path)?;

            if self.direct_io {
                disable_cache(&file)?;
            }

            Ok(Box::new(PlatformDirectFile::new(file)))
        }
    }
}

#[cfg(not(unix))]
impl DiskIO for PlatformDiskIO {
    fn open_target(&self, path: &Path) -> io::Result<Box<dyn DirectFile>> {
        if self.direct_io {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "direct I/O is only implemented for unix targets",
            ));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Box::new(PlatformDirectFile::new(file)))
    }
}

/// Create a new platform-specific target opener
pub fn create_disk_io(direct_io: bool) -> impl DiskIO {
    PlatformDiskIO::with_direct_io(direct_io)
}
