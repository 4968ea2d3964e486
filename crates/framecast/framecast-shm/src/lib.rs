//! `framecast-shm`: zero-copy single-producer, multi-consumer frame
//! transport over named POSIX shared memory.
//!
//! One producer publishes fixed-structure frame payloads (principally video
//! frames) into a versioned multi-buffer ring; any number of consumers on
//! the same host map the region and read the latest committed frame in
//! place. The ring keeps the latest frames and tolerates loss of older ones:
//! it is not a queue, and nothing is ever retransmitted.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐      named shm region        ┌───────────────┐
//! │   producer    │ ───────────────────────────  │   consumer    │
//! │  (Process A)  │   [control | N buffers]      │  (Process B)  │
//! └───────────────┘                              └───────────────┘
//!                                                ┌───────────────┐
//!                                                │   consumer    │
//!                                                │  (Process C)  │
//!                                                └───────────────┘
//! ```
//!
//! All synchronization lives in the atomic cells of the control header: a
//! writer publishes with a release store of the per-buffer ready flag, and
//! readers pin buffers with a per-buffer reader count. There is no lock
//! shared between processes.
//!
//! # Example
//!
//! ```ignore
//! use framecast_shm::{FrameLayout, ShmRegion, VersionCounter, now_micros};
//!
//! // Producer
//! let layout = FrameLayout::new(1 << 20, 3)?;
//! let mut region = ShmRegion::new("/camera_frames");
//! region.create_and_init(layout.required_size(), 1 << 20, 3)?;
//! let versions = VersionCounter::new();
//!
//! let mut guard = region.acquire_write_buffer(frame.len())?;
//! guard.as_mut_slice()[..frame.len()].copy_from_slice(&frame);
//! guard.commit(frame.len(), versions.next(), now_micros())?;
//!
//! // Consumer (same or different process)
//! let mut region = ShmRegion::new("/camera_frames");
//! region.open_and_map(layout.required_size(), 1 << 20, 3)?;
//! let guard = region.acquire_read_buffer()?;
//! decode(guard.as_slice(), guard.frame_version());
//! ```
//!
//! # Modules
//!
//! - `region`: lifecycle and the reservation protocol
//! - `guard`: scoped writer/reader reservations
//! - `layout`: binary layout of the region
//! - `control`: atomic cell accessors over the mapped header
//! - `compat`: copy-based write/read operations
//! - `clock`, `version`: commit timestamp and version-minting helpers

mod clock;
mod compat;
mod control;
mod error;
mod guard;
mod layout;
mod region;
mod version;

pub use clock::now_micros;
pub use error::{ShmError, ShmResult, ShmState};
pub use guard::{ReadGuard, WriteGuard};
pub use layout::FrameLayout;
pub use region::ShmRegion;
pub use version::VersionCounter;
