//! MediaInfo metadata extraction.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use mw_models::{AudioTrack, VideoMetadata, VideoTrack};

use crate::command::ToolRunner;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::file_size;
use crate::tools::MediaTools;

/// MediaInfo `--Output=JSON` document.
#[derive(Debug, Deserialize)]
struct MediaInfoOutput {
    media: Option<MediaInfoMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoMedia {
    #[serde(default)]
    track: Vec<MediaInfoTrack>,
}

/// One track; MediaInfo reports every value as a string.
#[derive(Debug, Deserialize)]
struct MediaInfoTrack {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "FileSize")]
    file_size: Option<String>,
    #[serde(rename = "Duration")]
    duration: Option<String>,
    #[serde(rename = "Format")]
    format: Option<String>,
    #[serde(rename = "CodecID")]
    codec_id: Option<String>,
    #[serde(rename = "Width")]
    width: Option<String>,
    #[serde(rename = "Height")]
    height: Option<String>,
    #[serde(rename = "FrameRate")]
    frame_rate: Option<String>,
    #[serde(rename = "BitRate")]
    bit_rate: Option<String>,
    #[serde(rename = "Channels", alias = "Channel(s)")]
    channels: Option<String>,
    #[serde(rename = "SamplingRate")]
    sampling_rate: Option<String>,
}

impl MediaInfoTrack {
    fn is(&self, kind: &str) -> bool {
        self.kind.eq_ignore_ascii_case(kind)
    }

    fn codec(&self) -> String {
        self.codec_id
            .clone()
            .or_else(|| self.format.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Run MediaInfo on `video_path` and extract container/track metadata.
pub async fn probe_metadata(
    tools: &MediaTools,
    runner: &ToolRunner,
    video_path: impl AsRef<Path>,
) -> MediaResult<VideoMetadata> {
    let video_path = video_path.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    let args = vec![
        "--Output=JSON".to_string(),
        video_path.to_string_lossy().to_string(),
    ];
    let output = runner.run("MediaInfo", &tools.mediainfo, &args).await?;

    let fallback_size = file_size(video_path).await?;
    parse_mediainfo(&output.stdout, video_path, fallback_size)
}

/// Build [`VideoMetadata`] from MediaInfo JSON.
///
/// `fallback_size` is used when the General track carries no `FileSize`.
pub fn parse_mediainfo(
    json: &[u8],
    video_path: &Path,
    fallback_size: u64,
) -> MediaResult<VideoMetadata> {
    let output: MediaInfoOutput = serde_json::from_slice(json)
        .map_err(|e| MediaError::malformed(format!("invalid MediaInfo output: {}", e)))?;

    let tracks = output
        .media
        .map(|m| m.track)
        .ok_or_else(|| MediaError::malformed("MediaInfo output has no media section"))?;

    let general = tracks.iter().find(|t| t.is("general"));
    let video = tracks
        .iter()
        .find(|t| t.is("video"))
        .ok_or_else(|| MediaError::InvalidVideo("No video track found".to_string()))?;
    let audio = tracks.iter().find(|t| t.is("audio"));

    let filesize_bytes = general
        .and_then(|g| parse_num::<u64>(&g.file_size))
        .unwrap_or(fallback_size);

    let duration_sec = parse_num::<f64>(&video.duration)
        .filter(|d| *d > 0.0)
        .or_else(|| general.and_then(|g| parse_num::<f64>(&g.duration)))
        .unwrap_or(0.0);

    let filename = video_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(VideoMetadata {
        filename,
        filesize_bytes,
        duration_sec,
        video: VideoTrack {
            codec: video.codec(),
            width: parse_num(&video.width).unwrap_or(0),
            height: parse_num(&video.height).unwrap_or(0),
            frame_rate: video
                .frame_rate
                .as_deref()
                .and_then(parse_frame_rate)
                .unwrap_or(0.0),
            bit_rate: parse_num(&video.bit_rate).unwrap_or(0),
        },
        audio: audio.map(|a| AudioTrack {
            codec: a.codec(),
            channels: parse_num(&a.channels).unwrap_or(0),
            sample_rate: parse_num(&a.sampling_rate).unwrap_or(0),
            bit_rate: parse_num(&a.bit_rate).unwrap_or(0),
        }),
    })
}

fn parse_num<T: FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

/// Parse frame rate string (e.g., "30/1" or "29.970").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    s.parse().ok()
}
