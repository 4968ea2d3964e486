//! Named POSIX shared-memory objects mapped read-write.
//!
//! This is the layer below the transport: `shm_open`/`ftruncate` manage the
//! named object, `memmap2` provides the mapping. Unmapping and closing happen
//! on drop.

use memmap2::MmapMut;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use std::fs::File;

/// Which stage of the create/open sequence failed.
///
/// Kept separate per stage so callers can report the exact failing syscall
/// instead of a collapsed "mapping failed".
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("shm_open failed")]
    Open(#[source] Errno),
    #[error("ftruncate failed")]
    Truncate(#[source] Errno),
    #[error("mmap failed")]
    Map(#[source] Errno),
}

/// A named shared-memory object together with its read-write mapping.
pub struct ShmMapping {
    _file: File,
    mmap: MmapMut,
    newly_created: bool,
}

impl ShmMapping {
    /// Create the named object sized to `size_bytes` and map it read-write.
    ///
    /// If the name already exists the object is attached as-is: it is not
    /// truncated and `newly_created()` reports false. On truncate or map
    /// failure the name is unlinked only when this call created it.
    pub fn create_rw(name: &str, size_bytes: u64) -> Result<Self, MapError> {
        let mode = Mode::S_IRUSR | Mode::S_IWUSR;
        let (fd, newly_created) =
            match shm_open(name, OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR, mode) {
                Ok(fd) => (fd, true),
                Err(Errno::EEXIST) => {
                    let fd = shm_open(name, OFlag::O_RDWR, mode).map_err(MapError::Open)?;
                    (fd, false)
                }
                Err(e) => return Err(MapError::Open(e)),
            };

        if newly_created {
            if let Err(e) = nix::unistd::ftruncate(&fd, size_bytes as libc::off_t) {
                drop(fd);
                let _ = shm_unlink(name);
                return Err(MapError::Truncate(e));
            }
        }

        let file = File::from(fd);
        match unsafe { MmapMut::map_mut(&file) } {
            Ok(mmap) => Ok(Self {
                _file: file,
                mmap,
                newly_created,
            }),
            Err(e) => {
                drop(file);
                if newly_created {
                    let _ = shm_unlink(name);
                }
                Err(MapError::Map(errno_of(e)))
            }
        }
    }

    /// Open an existing named object and map it read-write.
    ///
    /// Never truncates and never unlinks; the mapping length is whatever the
    /// creator sized the object to.
    pub fn open_rw(name: &str) -> Result<Self, MapError> {
        let fd =
            shm_open(name, OFlag::O_RDWR, Mode::S_IRUSR | Mode::S_IWUSR).map_err(MapError::Open)?;
        let file = File::from(fd);
        let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|e| MapError::Map(errno_of(e)))?;
        Ok(Self {
            _file: file,
            mmap,
            newly_created: false,
        })
    }

    /// Remove `name` from the shared-memory namespace.
    ///
    /// Existing mappings stay valid until their owners drop them.
    pub fn unlink(name: &str) -> Result<(), Errno> {
        shm_unlink(name)
    }

    /// Raw pointer to the start of the mapped region.
    #[inline]
    pub fn base_ptr(&self) -> *mut u8 {
        self.mmap.as_ptr() as *mut u8
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }

    /// True when this mapping's `create_rw` call created the name.
    #[inline]
    pub fn newly_created(&self) -> bool {
        self.newly_created
    }

    /// Write dirty pages back to the underlying object.
    pub fn flush(&self) -> Result<(), Errno> {
        self.mmap.flush().map_err(errno_of)
    }
}

fn errno_of(e: std::io::Error) -> Errno {
    Errno::from_raw(e.raw_os_error().unwrap_or(libc::EIO))
}
