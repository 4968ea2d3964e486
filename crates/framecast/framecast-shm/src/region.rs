//! Region lifecycle and the buffer reservation protocol.
//!
//! [`ShmRegion`] is the per-process handle over one named region. Lifecycle
//! transitions (`create_and_init`, `open_and_map`, `unmap_and_close`,
//! `unlink`) take `&mut self`, so they are mutually exclusive by
//! construction and can never run under a live reservation: guards borrow
//! the region for their whole lifetime.
//!
//! Reservations take `&self` and touch only the atomic cells of the control
//! header, so the hot path is wait-free: one bounded scan over the buffers
//! plus a handful of atomic loads and stores.
//!
//! # Buffer selection
//!
//! - A writer evicts the buffer with the **minimum** frame version (ties go
//!   to the lowest index): the least-recently-written slot, no worse than
//!   FIFO. A buffer pinned by readers is never stolen; the writer fails with
//!   `AcquireFailed` and the caller decides whether to retry.
//! - A reader picks the ready buffer with the **maximum** frame version
//!   (ties go to the lowest index) and pins it with its reader count while
//!   consuming in place.
//!
//! # Publication protocol
//!
//! A commit stores `data_size`, `timestamp_us`, `frame_version` and finally
//! `ready = true`, all with release ordering. A reader that acquires
//! `ready == true` therefore observes the matching metadata and payload of a
//! single commit; mixtures of two commits are not observable.
//!
//! In the contended window between a reader's scan and its pin, a writer may
//! claim the same slot. Both sides fail softly: the writer aborts when it
//! observes a non-zero reader count after clearing `ready`, and the reader
//! un-pins and reports `NoDataAvailable` when `ready` went false under it.

use crate::control::ControlHeader;
use crate::error::{ShmError, ShmResult, ShmState};
use crate::guard::{ReadGuard, WriteGuard};
use crate::layout::FrameLayout;
use framecast_mmap::ShmMapping;
use std::sync::atomic::Ordering;
use tracing::{debug, error, info};

/// Stateful manager of one named shared-memory region.
///
/// Construct with [`ShmRegion::new`], then bring up the mapping with either
/// [`create_and_init`](ShmRegion::create_and_init) (producer side) or
/// [`open_and_map`](ShmRegion::open_and_map) (consumer side). The region
/// name persists in the host namespace until [`unlink`](ShmRegion::unlink).
pub struct ShmRegion {
    name: String,
    mapping: Option<ShmMapping>,
    layout: Option<FrameLayout>,
    state: ShmState,
    is_creator: bool,
}

impl ShmRegion {
    /// A manager for the named region, in the `Uninitialized` state.
    ///
    /// `name` lives in the host's shared-memory namespace, e.g. `/yuyv_shm`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapping: None,
            layout: None,
            state: ShmState::Uninitialized,
            is_creator: false,
        }
    }

    /// Creates the named region, sizes it to `total_size`, maps it and
    /// initializes the control header.
    ///
    /// If the name already exists this attaches to it instead (without
    /// re-initializing) and [`is_creator`](ShmRegion::is_creator) reports
    /// false. On any intermediate failure partial state is rolled back; the
    /// name is unlinked only if this call created it.
    pub fn create_and_init(
        &mut self,
        total_size: usize,
        buffer_size: usize,
        buffer_count: u32,
    ) -> ShmResult<()> {
        if !matches!(self.state, ShmState::Uninitialized | ShmState::Closed) {
            let err = ShmError::AlreadyInitialized;
            error!(region = %self.name, status = err.as_str(), "create refused");
            return Err(err);
        }
        let layout = FrameLayout::validate(total_size, buffer_size, buffer_count)
            .inspect_err(|e| error!(region = %self.name, status = e.as_str(), "bad geometry"))?;

        let mapping = ShmMapping::create_rw(&self.name, total_size as u64).map_err(|e| {
            let err = ShmError::from(e);
            error!(region = %self.name, status = err.as_str(), "create failed");
            err
        })?;
        if mapping.len() < layout.required_size() {
            // Attached to an existing region sized by someone else.
            let err = ShmError::InvalidArguments;
            error!(region = %self.name, status = err.as_str(), "existing region is smaller than the requested layout");
            return Err(err);
        }

        let newly_created = mapping.newly_created();
        if newly_created {
            // SAFETY: the mapping covers layout.required_size() bytes,
            // checked above, and lives in self for the view's lifetime.
            let control = unsafe { ControlHeader::from_base(mapping.base_ptr(), layout) };
            control.init();
            info!(
                region = %self.name,
                total_size, buffer_size, buffer_count,
                "created and initialized shared memory region"
            );
        } else {
            debug!(region = %self.name, "name already exists, attached instead of creating");
        }

        self.mapping = Some(mapping);
        self.layout = Some(layout);
        self.is_creator = newly_created;
        self.state = ShmState::Created;
        Ok(())
    }

    /// Opens an existing named region and maps it with the expected geometry.
    ///
    /// `(total_size, buffer_size, buffer_count)` must match the creator's
    /// values; the stored preamble is checked against them and a mismatch is
    /// rejected with `InvalidArguments`.
    pub fn open_and_map(
        &mut self,
        total_size: usize,
        buffer_size: usize,
        buffer_count: u32,
    ) -> ShmResult<()> {
        if !matches!(self.state, ShmState::Uninitialized | ShmState::Closed) {
            let err = ShmError::AlreadyInitialized;
            error!(region = %self.name, status = err.as_str(), "open refused");
            return Err(err);
        }
        let layout = FrameLayout::validate(total_size, buffer_size, buffer_count)
            .inspect_err(|e| error!(region = %self.name, status = e.as_str(), "bad geometry"))?;

        let mapping = ShmMapping::open_rw(&self.name).map_err(|e| {
            let err = ShmError::from(e);
            error!(region = %self.name, status = err.as_str(), "open failed");
            err
        })?;
        if mapping.len() < layout.required_size() {
            let err = ShmError::InvalidArguments;
            error!(region = %self.name, status = err.as_str(), "region is smaller than the expected layout");
            return Err(err);
        }

        // SAFETY: length checked against the layout just above.
        let control = unsafe { ControlHeader::from_base(mapping.base_ptr(), layout) };
        if control.stored_buffer_count() != buffer_count
            || control.stored_buffer_size() != buffer_size as u64
        {
            let err = ShmError::InvalidArguments;
            error!(
                region = %self.name,
                status = err.as_str(),
                expected_count = buffer_count,
                stored_count = control.stored_buffer_count(),
                "region geometry does not match the creator's"
            );
            return Err(err);
        }

        self.mapping = Some(mapping);
        self.layout = Some(layout);
        self.is_creator = false;
        self.state = ShmState::Mapped;
        info!(region = %self.name, total_size, buffer_size, buffer_count, "opened and mapped shared memory region");
        Ok(())
    }

    /// Unmaps and closes the region handle. Idempotent: closing an already
    /// closed or never-opened manager succeeds and changes nothing.
    ///
    /// Does not unlink; the name and the region contents survive for other
    /// processes. A flush failure on the way out is reported as
    /// `UnmapFailed`, but the mapping is dropped regardless and the manager
    /// ends up `Closed`.
    pub fn unmap_and_close(&mut self) -> ShmResult<()> {
        if matches!(self.state, ShmState::Uninitialized | ShmState::Closed) {
            return Ok(());
        }
        let mut status = Ok(());
        if let Some(mapping) = self.mapping.take() {
            if let Err(errno) = mapping.flush() {
                let err = ShmError::UnmapFailed(errno);
                error!(region = %self.name, status = err.as_str(), %errno, "flush on close failed");
                status = Err(err);
            }
        }
        self.layout = None;
        self.state = ShmState::Closed;
        status
    }

    /// Removes the region name from the host namespace.
    ///
    /// Existing mappings (here and in other processes) stay valid until
    /// dropped. Any attached process may call this; the intended policy is
    /// that only the creator does.
    pub fn unlink(&self) -> ShmResult<()> {
        match ShmMapping::unlink(&self.name) {
            Ok(()) => {
                info!(region = %self.name, "unlinked shared memory region");
                Ok(())
            }
            Err(errno) => {
                let err = ShmError::UnlinkFailed(errno);
                error!(region = %self.name, status = err.as_str(), %errno, "unlink failed");
                Err(err)
            }
        }
    }

    // ─── Info ───────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ShmState {
        self.state
    }

    /// True while the region is mapped (either role).
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, ShmState::Created | ShmState::Mapped)
    }

    /// True when this manager's `create_and_init` created the name.
    pub fn is_creator(&self) -> bool {
        self.is_creator
    }

    /// Mapped length in bytes, 0 when not mapped.
    pub fn total_size(&self) -> usize {
        self.mapping.as_ref().map(ShmMapping::len).unwrap_or(0)
    }

    /// Per-buffer capacity in bytes, 0 when not mapped.
    pub fn buffer_size(&self) -> usize {
        self.layout.map(|l| l.buffer_size()).unwrap_or(0)
    }

    /// Number of data buffers, 0 when not mapped.
    pub fn buffer_count(&self) -> u32 {
        self.layout.map(|l| l.buffer_count()).unwrap_or(0)
    }

    /// Committed frame version of buffer `idx`; 0 means never written.
    /// `None` when the region is not mapped or `idx` is out of range.
    pub fn frame_version(&self, idx: u32) -> Option<u64> {
        let control = self.control().ok()?;
        if idx >= control.layout().buffer_count() {
            return None;
        }
        Some(control.frame_version(idx).load(Ordering::Acquire))
    }

    // ─── Reservations ───────────────────────────────────────────────────────

    /// Control-header view, available only while mapped.
    fn control(&self) -> ShmResult<ControlHeader> {
        match (&self.mapping, self.layout, self.state) {
            (Some(mapping), Some(layout), ShmState::Created | ShmState::Mapped) => {
                // SAFETY: the mapping was length-checked against this layout
                // when it was installed, and it outlives the borrow of self.
                Ok(unsafe { ControlHeader::from_base(mapping.base_ptr(), layout) })
            }
            _ => Err(ShmError::NotInitialized),
        }
    }

    /// Reserves the least-recently-written buffer for in-place writing.
    ///
    /// `expected_size` is checked against the per-buffer capacity up front
    /// (`BufferTooSmall`). If the chosen buffer is pinned by readers the
    /// acquisition fails with `AcquireFailed` and no reservation is made;
    /// pinned buffers are never stolen.
    ///
    /// One producer at a time: concurrent writers are not arbitrated, and
    /// two of them can select the same buffer. Running a single producer per
    /// region is a precondition, not an enforced property.
    pub fn acquire_write_buffer(&self, expected_size: usize) -> ShmResult<WriteGuard<'_>> {
        let control = self.control()?;
        let layout = control.layout();
        if expected_size > layout.buffer_size() {
            return Err(ShmError::BufferTooSmall);
        }

        let mut write_idx = 0u32;
        let mut min_version = u64::MAX;
        for i in 0..layout.buffer_count() {
            let version = control.frame_version(i).load(Ordering::Acquire);
            if version < min_version {
                min_version = version;
                write_idx = i;
            }
        }

        // Hide the slot from readers that begin scanning now, then check for
        // readers that pinned it first. A reader racing past the scan
        // re-checks `ready` after pinning, so one side always backs off.
        control.ready(write_idx).store(false, Ordering::Release);
        if control.reader_count(write_idx).load(Ordering::Acquire) > 0 {
            return Err(ShmError::AcquireFailed);
        }

        Ok(WriteGuard::new(
            self,
            write_idx,
            control.buffer_ptr(write_idx),
            layout.buffer_size(),
        ))
    }

    /// Pins the latest committed buffer for in-place reading.
    ///
    /// Among ready buffers the one with the highest frame version wins;
    /// `NoDataAvailable` when nothing has been committed yet (or a writer
    /// claimed the chosen slot in the race window). Any number of readers
    /// may pin the same buffer concurrently.
    pub fn acquire_read_buffer(&self) -> ShmResult<ReadGuard<'_>> {
        let control = self.control()?;
        let layout = control.layout();

        let mut latest: Option<u32> = None;
        let mut max_version = 0u64;
        for i in 0..layout.buffer_count() {
            if control.ready(i).load(Ordering::Acquire) {
                let version = control.frame_version(i).load(Ordering::Acquire);
                if version > max_version {
                    max_version = version;
                    latest = Some(i);
                }
            }
        }
        let Some(idx) = latest else {
            return Err(ShmError::NoDataAvailable);
        };

        control.reader_count(idx).fetch_add(1, Ordering::Acquire);
        // A writer may have claimed this slot between the scan and the pin;
        // its acquire check sees our increment or we see its cleared flag.
        if !control.ready(idx).load(Ordering::Acquire) {
            control.reader_count(idx).fetch_sub(1, Ordering::Release);
            return Err(ShmError::NoDataAvailable);
        }

        let data_size = control.data_size(idx).load(Ordering::Acquire) as usize;
        let frame_version = control.frame_version(idx).load(Ordering::Acquire);
        let timestamp_us = control.timestamp_us(idx).load(Ordering::Acquire);
        Ok(ReadGuard::new(
            self,
            idx,
            control.buffer_ptr(idx),
            data_size,
            frame_version,
            timestamp_us,
        ))
    }

    /// Publishes buffer `idx`: metadata first, `ready` last, all release.
    pub(crate) fn commit_write(
        &self,
        idx: u32,
        actual_size: usize,
        frame_version: u64,
        timestamp_us: u64,
    ) -> ShmResult<()> {
        let control = self.control()?;
        let layout = control.layout();
        if idx >= layout.buffer_count() {
            return Err(ShmError::InvalidArguments);
        }
        if actual_size > layout.buffer_size() {
            return Err(ShmError::BufferTooSmall);
        }
        control
            .data_size(idx)
            .store(actual_size as u64, Ordering::Release);
        control
            .timestamp_us(idx)
            .store(timestamp_us, Ordering::Release);
        control
            .frame_version(idx)
            .store(frame_version, Ordering::Release);
        control.ready(idx).store(true, Ordering::Release);
        Ok(())
    }

    /// Abandons an uncommitted write reservation.
    ///
    /// Leaves every control cell untouched: `ready` went false at acquire
    /// time and stays false, so readers never observe the abandoned bytes.
    /// `data_size` is only meaningful while `ready` is true.
    pub(crate) fn release_write(&self, _idx: u32) {}

    /// Drops a reader pin on buffer `idx`.
    pub(crate) fn release_read(&self, idx: u32) {
        if let Ok(control) = self.control() {
            control.reader_count(idx).fetch_sub(1, Ordering::Release);
        }
    }
}
