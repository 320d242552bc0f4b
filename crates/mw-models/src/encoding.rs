//! Encoding settings for thumbnails and HLS bundles.

use serde::{Deserialize, Serialize};

use crate::quality::QualityProfile;

/// Default thumbnail width in pixels (height follows the aspect ratio).
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 640;
/// JPEG quality for thumbnails (`-q:v`, 2 = high)
pub const THUMBNAIL_JPEG_QUALITY: u8 = 2;

/// HLS segment duration in seconds
pub const HLS_SEGMENT_SECONDS: u32 = 10;
/// Name of the playlist written into every bundle directory
pub const MASTER_PLAYLIST_NAME: &str = "master.m3u8";
/// Extension of HLS media segments
pub const SEGMENT_EXTENSION: &str = "ts";

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Resolution both inputs are scaled to before VMAF comparison
pub const VMAF_COMPARE_WIDTH: u32 = 1920;
pub const VMAF_COMPARE_HEIGHT: u32 = 1080;
/// Default location of the VMAF model shipped with libvmaf
pub const DEFAULT_VMAF_MODEL_PATH: &str = "/usr/local/share/model/vmaf_v0.6.1.json";

/// HLS encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HlsEncoding {
    /// Video codec
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// H.264 profile
    #[serde(default = "default_profile")]
    pub profile: String,

    /// H.264 level
    #[serde(default = "default_level")]
    pub level: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Segment duration in seconds
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: u32,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_profile() -> String {
    "baseline".to_string()
}
fn default_level() -> String {
    "3.0".to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_segment_seconds() -> u32 {
    HLS_SEGMENT_SECONDS
}

impl Default for HlsEncoding {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            profile: default_profile(),
            level: default_level(),
            audio_codec: default_audio_codec(),
            segment_seconds: HLS_SEGMENT_SECONDS,
        }
    }
}

impl HlsEncoding {
    /// Convert to FFmpeg output arguments for the given profile.
    ///
    /// The playlist path itself is not included.
    pub fn to_ffmpeg_args(&self, quality: &QualityProfile) -> Vec<String> {
        vec![
            "-profile:v".to_string(),
            self.profile.clone(),
            "-level".to_string(),
            self.level.clone(),
            "-s".to_string(),
            quality.resolution(),
            "-start_number".to_string(),
            "0".to_string(),
            "-hls_time".to_string(),
            self.segment_seconds.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-f".to_string(),
            "hls".to_string(),
            "-c:v".to_string(),
            self.codec.clone(),
            "-b:v".to_string(),
            quality.video_bitrate.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            quality.audio_bitrate.to_string(),
            "-max_muxing_queue_size".to_string(),
            "9999".to_string(),
        ]
    }
}
