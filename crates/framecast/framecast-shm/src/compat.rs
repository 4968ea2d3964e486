//! Copy-based compatibility operations.
//!
//! For callers that cannot thread a guard's lifetime through their control
//! flow: these copy in and out of the ring instead of exposing it in place,
//! built entirely on the guard protocol so no new race surface appears.

use crate::clock::now_micros;
use crate::error::{ShmError, ShmResult};
use crate::region::ShmRegion;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Acquire attempts before `write_and_switch` gives up on a pinned ring.
const WRITE_RETRY_LIMIT: u32 = 1000;

/// Poll interval of the blocking read loop.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

impl ShmRegion {
    /// Copies `data` into the ring and publishes it under `frame_version`
    /// with a fresh wall-clock timestamp.
    ///
    /// Retries a contended acquisition up to 1000 times with a cooperative
    /// yield between attempts, then gives up with `AcquireFailed`. All other
    /// errors propagate immediately.
    pub fn write_and_switch(&self, data: &[u8], frame_version: u64) -> ShmResult<()> {
        if data.is_empty() {
            return Err(ShmError::InvalidArguments);
        }
        let mut attempts = 0;
        let mut guard = loop {
            match self.acquire_write_buffer(data.len()) {
                Ok(guard) => break guard,
                Err(ShmError::AcquireFailed) if attempts < WRITE_RETRY_LIMIT => {
                    attempts += 1;
                    thread::yield_now();
                }
                Err(e) => return Err(e),
            }
        };
        guard.as_mut_slice()[..data.len()].copy_from_slice(data);
        guard.commit(data.len(), frame_version, now_micros())
    }

    /// Copies the latest committed frame into `out`, truncating to
    /// `out.len()` if needed. Returns the number of bytes copied.
    pub fn try_read_latest(&self, out: &mut [u8]) -> ShmResult<usize> {
        if out.is_empty() {
            return Err(ShmError::InvalidArguments);
        }
        let guard = self.acquire_read_buffer()?;
        let copy_len = out.len().min(guard.len());
        out[..copy_len].copy_from_slice(&guard.as_slice()[..copy_len]);
        Ok(copy_len)
    }

    /// Like [`try_read_latest`](ShmRegion::try_read_latest), but sleeps in
    /// 10 ms intervals until a frame is committed. The only indefinitely
    /// blocking operation of the transport; errors other than
    /// `NoDataAvailable` propagate immediately.
    pub fn wait_and_read(&self, out: &mut [u8]) -> ShmResult<usize> {
        loop {
            match self.try_read_latest(out) {
                Err(ShmError::NoDataAvailable) => thread::sleep(WAIT_POLL_INTERVAL),
                other => return other,
            }
        }
    }

    /// [`wait_and_read`](ShmRegion::wait_and_read) with cooperative
    /// cancellation: checks `stop` between sleeps and returns
    /// `NoDataAvailable` once it is raised.
    pub fn wait_and_read_until(&self, out: &mut [u8], stop: &AtomicBool) -> ShmResult<usize> {
        loop {
            match self.try_read_latest(out) {
                Err(ShmError::NoDataAvailable) => {
                    if stop.load(Ordering::Acquire) {
                        return Err(ShmError::NoDataAvailable);
                    }
                    thread::sleep(WAIT_POLL_INTERVAL);
                }
                other => return other,
            }
        }
    }
}
