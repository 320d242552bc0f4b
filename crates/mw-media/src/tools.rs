//! Locations of the external tools the pipeline drives.

use std::path::PathBuf;

use mw_models::encoding::DEFAULT_VMAF_MODEL_PATH;

/// Paths to FFmpeg, MediaInfo and the VMAF model.
#[derive(Debug, Clone)]
pub struct MediaTools {
    pub ffmpeg: PathBuf,
    pub mediainfo: PathBuf,
    pub vmaf_model: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            mediainfo: PathBuf::from("mediainfo"),
            vmaf_model: PathBuf::from(DEFAULT_VMAF_MODEL_PATH),
        }
    }
}

impl MediaTools {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ffmpeg: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg),
            mediainfo: std::env::var("MEDIAINFO_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.mediainfo),
            vmaf_model: std::env::var("VMAF_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.vmaf_model),
        }
    }
}
