//! Probe metadata attached to completed tasks.

use serde::{Deserialize, Serialize};

/// Container and track information for a source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Base name of the probed file
    pub filename: String,
    /// File size in bytes
    pub filesize_bytes: u64,
    /// Duration in seconds
    pub duration_sec: f64,
    /// First video track
    pub video: VideoTrack,
    /// First audio track; absent when the source has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoTrack {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// Bits per second, 0 when unknown
    pub bit_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub codec: String,
    pub channels: u32,
    /// Hz
    pub sample_rate: u32,
    /// Bits per second, 0 when unknown
    pub bit_rate: u64,
}

impl VideoMetadata {
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}
