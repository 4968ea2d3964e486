use serde::Deserialize;
use std::path::Path;

/// Video capture (V4L2) configuration consumed by the capture process.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VideoCaptureConfig {
    #[serde(default = "defaults::device_path")]
    pub device_path: String,
    /// Four-character pixel format code, e.g. "YUYV" or "MJPG".
    #[serde(default = "defaults::pixel_format")]
    pub pixel_format: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "defaults::capture_buffer_count")]
    pub capture_buffer_count: u32,
}

/// Shared-memory transport configuration: region name and geometry.
///
/// Producer and consumers must load identical values; the region layout is
/// fixed at creation and attach-time geometry must match it.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShmTransportConfig {
    #[serde(default = "defaults::region_name")]
    pub name: String,
    pub total_size_bytes: usize,
    pub buffer_size_bytes: usize,
    #[serde(default = "defaults::buffer_count")]
    pub buffer_count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn device_path() -> String {
        "/dev/video0".into()
    }

    pub fn pixel_format() -> String {
        "YUYV".into()
    }

    pub fn capture_buffer_count() -> u32 {
        4
    }

    pub fn region_name() -> String {
        "/framecast_frames".into()
    }

    pub fn buffer_count() -> u32 {
        3
    }
}

impl VideoCaptureConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: VideoCaptureConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    /// The pixel format packed as a little-endian four-character code, the
    /// way V4L2 identifies capture formats. `None` unless the code is
    /// exactly four bytes.
    pub fn pixel_format_fourcc(&self) -> Option<u32> {
        let b = self.pixel_format.as_bytes();
        if b.len() != 4 {
            return None;
        }
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl ShmTransportConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: ShmTransportConfig = toml::from_str(&raw)?;
        Ok(config)
    }
}
