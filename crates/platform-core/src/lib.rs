//! Photo Align platform core contracts.
//!
//! This crate contains cross-platform device inventory, stream constraint,
//! and frame data structures shared by the capture, render, and UI crates
//! without coupling to a concrete OS backend.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Classification of a host media device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaDeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

impl fmt::Display for MediaDeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VideoInput => "videoinput",
            Self::AudioInput => "audioinput",
            Self::AudioOutput => "audiooutput",
        };
        f.write_str(name)
    }
}

/// One entry of the host device inventory.
///
/// Identifiers are opaque: they are only ever handed back to the backend
/// that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    /// Backend-specific device identifier.
    pub device_id: String,

    /// Devices belonging to the same physical unit share a group id.
    pub group_id: String,

    /// Human-readable label. May be empty when the host withholds it.
    pub label: String,

    /// Device classification.
    pub kind: MediaDeviceKind,
}

impl MediaDeviceInfo {
    pub fn video_input(
        device_id: impl Into<String>,
        group_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            group_id: group_id.into(),
            label: label.into(),
            kind: MediaDeviceKind::VideoInput,
        }
    }

    /// Text shown for this device: the label, or the id when the label is empty.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.device_id
        } else {
            &self.label
        }
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == MediaDeviceKind::VideoInput
    }
}

/// Keep only the video inputs of an inventory, preserving host order.
pub fn video_inputs(devices: impl IntoIterator<Item = MediaDeviceInfo>) -> Vec<MediaDeviceInfo> {
    devices
        .into_iter()
        .filter(MediaDeviceInfo::is_video_input)
        .collect()
}

/// Video track requirements for a stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    /// Minimum frame width in pixels.
    pub min_width: u32,
    /// Minimum frame height in pixels.
    pub min_height: u32,
    /// Device the stream must come from.
    pub device_id: String,
    /// Group of the requested device.
    pub group_id: String,
}

/// A live stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStreamConstraints {
    pub video: VideoConstraints,
    /// Whether an audio track is requested. Photo capture never asks for one.
    pub audio: bool,
}

impl MediaStreamConstraints {
    /// Video-only constraints bound to one device.
    pub fn for_device(device: &MediaDeviceInfo, min_width: u32, min_height: u32) -> Self {
        Self {
            video: VideoConstraints {
                min_width,
                min_height,
                device_id: device.device_id.clone(),
                group_id: device.group_id.clone(),
            },
            audio: false,
        }
    }
}

/// A decoded video frame in tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, row-major, no padding.
    pub pixels: Arc<[u8]>,
    /// Monotonic per-stream counter; changes whenever a new frame arrives.
    pub sequence: u64,
}

impl VideoFrame {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Build a frame, returning `None` when the buffer does not match the size.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>, sequence: u64) -> Option<Self> {
        if pixels.len() != Self::expected_len(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: pixels.into(),
            sequence,
        })
    }

    /// Byte length of a packed RGBA frame of the given size.
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::BYTES_PER_PIXEL
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
