//! Atomic cell accessors over a mapped control header.
//!
//! `ControlHeader` is a borrowed view: it holds the mapping base and a
//! [`FrameLayout`], and derives every cell reference on demand. Nothing in
//! the region ever stores a pointer, so views built by different processes
//! (at different base addresses) address the same cells.

use crate::layout::{BUFFER_COUNT_OFFSET, BUFFER_SIZE_OFFSET, FrameLayout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

pub(crate) struct ControlHeader {
    base: NonNull<u8>,
    layout: FrameLayout,
}

impl ControlHeader {
    /// Builds a view over `base`.
    ///
    /// # Safety
    /// `base` must point to a live mapping of at least
    /// `layout.required_size()` bytes that outlives every use of the view.
    pub(crate) unsafe fn from_base(base: *mut u8, layout: FrameLayout) -> Self {
        // SAFETY: mapping bases are never null.
        let base = unsafe { NonNull::new_unchecked(base) };
        Self { base, layout }
    }

    #[inline]
    pub(crate) fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Reference to the atomic cell of type `T` at `offset`.
    #[inline]
    fn cell<T>(&self, offset: usize) -> &T {
        // SAFETY: the layout keeps every offset in bounds and naturally
        // aligned for its cell type; the mapping outlives `self`.
        unsafe { &*(self.base.as_ptr().add(offset) as *const T) }
    }

    pub(crate) fn stored_buffer_count(&self) -> u32 {
        self.cell::<AtomicU32>(BUFFER_COUNT_OFFSET)
            .load(Ordering::Acquire)
    }

    pub(crate) fn stored_buffer_size(&self) -> u64 {
        self.cell::<AtomicU64>(BUFFER_SIZE_OFFSET)
            .load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn frame_version(&self, idx: u32) -> &AtomicU64 {
        self.cell(self.layout.frame_version_offset(idx))
    }

    #[inline]
    pub(crate) fn timestamp_us(&self, idx: u32) -> &AtomicU64 {
        self.cell(self.layout.timestamp_offset(idx))
    }

    #[inline]
    pub(crate) fn data_size(&self, idx: u32) -> &AtomicU64 {
        self.cell(self.layout.data_size_offset(idx))
    }

    #[inline]
    pub(crate) fn ready(&self, idx: u32) -> &AtomicBool {
        self.cell(self.layout.ready_offset(idx))
    }

    #[inline]
    pub(crate) fn reader_count(&self, idx: u32) -> &AtomicU32 {
        self.cell(self.layout.reader_count_offset(idx))
    }

    /// Pointer to the start of data buffer `idx`.
    #[inline]
    pub(crate) fn buffer_ptr(&self, idx: u32) -> NonNull<u8> {
        // SAFETY: buffer_offset(idx) is in bounds for idx < buffer_count,
        // and offsetting a non-null base stays non-null.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(self.layout.buffer_offset(idx))) }
    }

    /// Creator-side initialization: stores the preamble, then zeroes every
    /// per-buffer cell. Attachers must never call this.
    pub(crate) fn init(&self) {
        self.cell::<AtomicU32>(BUFFER_COUNT_OFFSET)
            .store(self.layout.buffer_count(), Ordering::Release);
        self.cell::<AtomicU64>(BUFFER_SIZE_OFFSET)
            .store(self.layout.buffer_size() as u64, Ordering::Release);
        for i in 0..self.layout.buffer_count() {
            self.frame_version(i).store(0, Ordering::Release);
            self.timestamp_us(i).store(0, Ordering::Release);
            self.data_size(i).store(0, Ordering::Release);
            self.ready(i).store(false, Ordering::Release);
            self.reader_count(i).store(0, Ordering::Release);
        }
    }
}
