//! Status taxonomy and lifecycle states of the transport.

use nix::errno::Errno;

/// Result alias used by every fallible transport operation.
pub type ShmResult<T> = Result<T, ShmError>;

/// Status codes of the transport.
///
/// Success is `Ok` of [`ShmResult`]; every failure is one of these variants
/// and is never mapped onto another. Lifecycle variants carry the errno of
/// the refusing syscall as their source. [`ShmError::as_str`] gives the
/// stable diagnostic label for each code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShmError {
    #[error("already initialized")]
    AlreadyInitialized,
    #[error("not initialized")]
    NotInitialized,
    #[error("shared memory open failed")]
    OpenFailed(#[source] Errno),
    #[error("shared memory truncate failed")]
    TruncateFailed(#[source] Errno),
    #[error("shared memory map failed")]
    MapFailed(#[source] Errno),
    #[error("shared memory unmap failed")]
    UnmapFailed(#[source] Errno),
    #[error("shared memory unlink failed")]
    UnlinkFailed(#[source] Errno),
    #[error("invalid arguments")]
    InvalidArguments,
    #[error("buffer too small")]
    BufferTooSmall,
    #[error("buffer in use")]
    BufferInUse,
    #[error("no data available")]
    NoDataAvailable,
    #[error("acquire failed")]
    AcquireFailed,
}

impl ShmError {
    /// Stable diagnostic label, independent of any carried errno.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShmError::AlreadyInitialized => "already initialized",
            ShmError::NotInitialized => "not initialized",
            ShmError::OpenFailed(_) => "shared memory open failed",
            ShmError::TruncateFailed(_) => "shared memory truncate failed",
            ShmError::MapFailed(_) => "shared memory map failed",
            ShmError::UnmapFailed(_) => "shared memory unmap failed",
            ShmError::UnlinkFailed(_) => "shared memory unlink failed",
            ShmError::InvalidArguments => "invalid arguments",
            ShmError::BufferTooSmall => "buffer too small",
            ShmError::BufferInUse => "buffer in use",
            ShmError::NoDataAvailable => "no data available",
            ShmError::AcquireFailed => "acquire failed",
        }
    }
}

impl From<framecast_mmap::MapError> for ShmError {
    fn from(e: framecast_mmap::MapError) -> Self {
        match e {
            framecast_mmap::MapError::Open(errno) => ShmError::OpenFailed(errno),
            framecast_mmap::MapError::Truncate(errno) => ShmError::TruncateFailed(errno),
            framecast_mmap::MapError::Map(errno) => ShmError::MapFailed(errno),
        }
    }
}

/// Lifecycle state of a [`ShmRegion`](crate::ShmRegion).
///
/// `Created` and `Mapped` both mean "mapped and usable"; they record whether
/// this manager went through the creator path or the attacher path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShmState {
    Uninitialized,
    Created,
    Mapped,
    Closed,
}
