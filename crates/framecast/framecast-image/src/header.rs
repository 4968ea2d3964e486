//! Wire format of the framed image payload.
//!
//! A framed payload is `[ImageHeader | image bytes]` inside one transport
//! buffer. The header is packed little-endian in declared field order, so
//! the encoded form is identical across processes and architectures.

use framecast_shm::{ShmError, ShmResult};

/// Pixel or stream format of a framed image.
///
/// Serialized as a small integer tag; the set is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ImageFormat {
    /// Packed YUV 4:2:2, two bytes per pixel.
    Yuyv = 0,
    /// Motion-JPEG compressed frames.
    Mjpg = 1,
    /// Packed 8-bit BGR.
    Bgr = 2,
    /// H.264 elementary stream; `frame_type` distinguishes I/P/B.
    H264 = 3,
}

impl ImageFormat {
    /// Wire tag of this format.
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Format for a wire tag, `None` for tags outside the closed set.
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(ImageFormat::Yuyv),
            1 => Some(ImageFormat::Mjpg),
            2 => Some(ImageFormat::Bgr),
            3 => Some(ImageFormat::H264),
            _ => None,
        }
    }

    /// Maps a capture four-character code onto a format, where one exists.
    pub fn from_fourcc(code: &str) -> Option<Self> {
        match code {
            "YUYV" => Some(ImageFormat::Yuyv),
            "MJPG" => Some(ImageFormat::Mjpg),
            "BGR3" => Some(ImageFormat::Bgr),
            "H264" => Some(ImageFormat::H264),
            _ => None,
        }
    }
}

/// Fixed header prefixed to every framed payload.
///
/// `data_size` counts the image bytes that follow the header; the committed
/// transport size is always `ENCODED_LEN + data_size`. `frame_type` is
/// carried through verbatim (H.264 producers use 1/2/3 for I/P/B frames,
/// raw formats leave it 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data_size: u32,
    pub frame_type: u8,
}

impl ImageHeader {
    /// Encoded size: five u32 fields plus one byte, packed.
    pub const ENCODED_LEN: usize = 21;

    /// Serializes the header into `out`, little-endian, declared order.
    pub fn encode_into(&self, out: &mut [u8; Self::ENCODED_LEN]) {
        out[0..4].copy_from_slice(&self.format.tag().to_le_bytes());
        out[4..8].copy_from_slice(&self.width.to_le_bytes());
        out[8..12].copy_from_slice(&self.height.to_le_bytes());
        out[12..16].copy_from_slice(&self.channels.to_le_bytes());
        out[16..20].copy_from_slice(&self.data_size.to_le_bytes());
        out[20] = self.frame_type;
    }

    /// Decodes a header from the first `ENCODED_LEN` bytes of `bytes`.
    ///
    /// `InvalidArguments` for a short slice or an unknown format tag.
    pub fn decode(bytes: &[u8]) -> ShmResult<Self> {
        if bytes.len() < Self::ENCODED_LEN {
            return Err(ShmError::InvalidArguments);
        }
        let format =
            ImageFormat::from_tag(le_u32(bytes, 0)).ok_or(ShmError::InvalidArguments)?;
        Ok(Self {
            format,
            width: le_u32(bytes, 4),
            height: le_u32(bytes, 8),
            channels: le_u32(bytes, 12),
            data_size: le_u32(bytes, 16),
            frame_type: bytes[20],
        })
    }
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The wire size is part of the cross-process contract: a change here
    /// breaks every attached consumer.
    #[test]
    fn encoded_len_is_stable() {
        assert_eq!(ImageHeader::ENCODED_LEN, 21);
    }

    #[test]
    fn header_survives_the_wire() {
        let header = ImageHeader {
            format: ImageFormat::H264,
            width: 1920,
            height: 1080,
            channels: 3,
            data_size: 65_536,
            frame_type: 2,
        };
        let mut wire = [0u8; ImageHeader::ENCODED_LEN];
        header.encode_into(&mut wire);
        assert_eq!(ImageHeader::decode(&wire), Ok(header));
        // Tag and dimensions land little-endian in declared order.
        assert_eq!(&wire[0..4], &3u32.to_le_bytes());
        assert_eq!(&wire[4..8], &1920u32.to_le_bytes());
        assert_eq!(wire[20], 2);
    }

    #[test]
    fn decode_rejects_short_input_and_unknown_tags() {
        assert_eq!(
            ImageHeader::decode(&[0u8; ImageHeader::ENCODED_LEN - 1]),
            Err(ShmError::InvalidArguments)
        );
        let mut wire = [0u8; ImageHeader::ENCODED_LEN];
        wire[0..4].copy_from_slice(&9u32.to_le_bytes());
        assert_eq!(ImageHeader::decode(&wire), Err(ShmError::InvalidArguments));
    }

    #[test]
    fn fourcc_codes_map_to_formats() {
        assert_eq!(ImageFormat::from_fourcc("YUYV"), Some(ImageFormat::Yuyv));
        assert_eq!(ImageFormat::from_fourcc("MJPG"), Some(ImageFormat::Mjpg));
        assert_eq!(ImageFormat::from_fourcc("BGR3"), Some(ImageFormat::Bgr));
        assert_eq!(ImageFormat::from_fourcc("H264"), Some(ImageFormat::H264));
        assert_eq!(ImageFormat::from_fourcc("GREY"), None);
    }
}
