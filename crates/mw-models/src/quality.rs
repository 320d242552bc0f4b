//! Quality profiles for HLS transcoding.

use serde::Serialize;
use thiserror::Error;

/// Encoding parameters for one quality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityProfile {
    /// Quality label as it appears in jobs
    pub label: &'static str,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Target video bitrate (FFmpeg notation)
    pub video_bitrate: &'static str,
    /// Target audio bitrate (FFmpeg notation)
    pub audio_bitrate: &'static str,
}

/// The closed set of supported profiles.
pub const QUALITY_PROFILES: [QualityProfile; 3] = [
    QualityProfile {
        label: "480p",
        width: 854,
        height: 480,
        video_bitrate: "1000k",
        audio_bitrate: "128k",
    },
    QualityProfile {
        label: "720p",
        width: 1280,
        height: 720,
        video_bitrate: "2500k",
        audio_bitrate: "128k",
    },
    QualityProfile {
        label: "1080p",
        width: 1920,
        height: 1080,
        video_bitrate: "5000k",
        audio_bitrate: "192k",
    },
];

/// A quality label outside [`QUALITY_PROFILES`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported quality: {label}. Available: {}", QualityProfile::labels().join(", "))]
pub struct UnknownQuality {
    pub label: String,
}

impl QualityProfile {
    /// Look up a profile by label.
    pub fn lookup(label: &str) -> Result<&'static QualityProfile, UnknownQuality> {
        QUALITY_PROFILES
            .iter()
            .find(|p| p.label == label)
            .ok_or_else(|| UnknownQuality {
                label: label.to_string(),
            })
    }

    /// All supported labels, lowest quality first.
    pub fn labels() -> Vec<&'static str> {
        QUALITY_PROFILES.iter().map(|p| p.label).collect()
    }

    /// Resolution in `WxH` form, as passed to `-s`.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
