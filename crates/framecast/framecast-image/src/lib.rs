//! `framecast-image`: header-prefixed image frames over the shared-memory
//! transport.
//!
//! A thin framing layer: every payload carries a fixed [`ImageHeader`]
//! (format, dimensions, channels, size, frame type) ahead of the image
//! bytes, so consumers can route a frame to the right decoder without any
//! side channel. The transport below is untouched; this crate only decides
//! what the opaque payload bytes mean.

mod header;

pub use header::{ImageFormat, ImageHeader};

use framecast_shm::{ShmError, ShmRegion, ShmResult, ShmState, now_micros};

/// Metadata of a frame returned by [`ImageRegion::read_image`].
///
/// Header fields are carried through verbatim; `frame_version` and
/// `timestamp_us` come from the transport commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data_size: usize,
    pub format: ImageFormat,
    pub frame_type: u8,
    pub frame_version: u64,
    pub timestamp_us: u64,
}

/// A transport region whose payloads are `[ImageHeader | image bytes]`.
///
/// Wraps a [`ShmRegion`] with the same lifecycle surface; the underlying
/// region stays reachable through [`region`](ImageRegion::region) for
/// callers that want the raw transport alongside framed access.
pub struct ImageRegion {
    region: ShmRegion,
}

impl ImageRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            region: ShmRegion::new(name),
        }
    }

    pub fn create_and_init(
        &mut self,
        total_size: usize,
        buffer_size: usize,
        buffer_count: u32,
    ) -> ShmResult<()> {
        self.region
            .create_and_init(total_size, buffer_size, buffer_count)
    }

    pub fn open_and_map(
        &mut self,
        total_size: usize,
        buffer_size: usize,
        buffer_count: u32,
    ) -> ShmResult<()> {
        self.region.open_and_map(total_size, buffer_size, buffer_count)
    }

    pub fn unmap_and_close(&mut self) -> ShmResult<()> {
        self.region.unmap_and_close()
    }

    pub fn unlink(&self) -> ShmResult<()> {
        self.region.unlink()
    }

    pub fn state(&self) -> ShmState {
        self.region.state()
    }

    /// The underlying transport region.
    pub fn region(&self) -> &ShmRegion {
        &self.region
    }

    /// Frames `data` with an [`ImageHeader`] and publishes it under
    /// `frame_version` with a fresh wall-clock timestamp.
    ///
    /// Rejects empty data, zero dimensions, or YUYV with `channels != 2`
    /// (`InvalidArguments`); a frame that cannot fit one buffer
    /// (`BufferTooSmall`); and a ring whose eviction target is pinned
    /// (`BufferInUse`).
    #[allow(clippy::too_many_arguments)]
    pub fn write_image(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        channels: u32,
        frame_version: u64,
        format: ImageFormat,
        frame_type: u8,
    ) -> ShmResult<()> {
        if data.is_empty() || width == 0 || height == 0 {
            return Err(ShmError::InvalidArguments);
        }
        if format == ImageFormat::Yuyv && channels != 2 {
            return Err(ShmError::InvalidArguments);
        }
        let data_size = u32::try_from(data.len()).map_err(|_| ShmError::InvalidArguments)?;
        let total_size = ImageHeader::ENCODED_LEN + data.len();
        if total_size > self.region.buffer_size() {
            return Err(ShmError::BufferTooSmall);
        }

        let mut guard = match self.region.acquire_write_buffer(total_size) {
            Ok(guard) => guard,
            Err(ShmError::AcquireFailed) => return Err(ShmError::BufferInUse),
            Err(e) => return Err(e),
        };

        let header = ImageHeader {
            format,
            width,
            height,
            channels,
            data_size,
            frame_type,
        };
        let mut encoded = [0u8; ImageHeader::ENCODED_LEN];
        header.encode_into(&mut encoded);

        let buf = guard.as_mut_slice();
        buf[..ImageHeader::ENCODED_LEN].copy_from_slice(&encoded);
        buf[ImageHeader::ENCODED_LEN..total_size].copy_from_slice(data);
        guard.commit(total_size, frame_version, now_micros())
    }

    /// Reads the latest framed image: payload bytes into `out`, header and
    /// transport metadata into the returned [`ImageInfo`].
    ///
    /// `NoDataAvailable` when nothing is committed; `InvalidArguments` when
    /// the committed frame is not exactly a header plus its declared
    /// payload; `BufferTooSmall` when `out` cannot hold the payload.
    pub fn read_image(&self, out: &mut [u8]) -> ShmResult<ImageInfo> {
        let guard = self.region.acquire_read_buffer()?;
        let committed = guard.as_slice();
        if committed.len() < ImageHeader::ENCODED_LEN {
            return Err(ShmError::InvalidArguments);
        }
        let header = ImageHeader::decode(committed)?;
        let payload_len = header.data_size as usize;
        if ImageHeader::ENCODED_LEN + payload_len != committed.len() {
            return Err(ShmError::InvalidArguments);
        }
        if payload_len > out.len() {
            return Err(ShmError::BufferTooSmall);
        }
        out[..payload_len].copy_from_slice(&committed[ImageHeader::ENCODED_LEN..]);
        Ok(ImageInfo {
            width: header.width,
            height: header.height,
            channels: header.channels,
            data_size: payload_len,
            format: header.format,
            frame_type: header.frame_type,
            frame_version: guard.frame_version(),
            timestamp_us: guard.timestamp_us(),
        })
    }
}
