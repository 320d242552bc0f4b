//! Thumbnail generation.

use std::path::{Path, PathBuf};

use mw_models::encoding::THUMBNAIL_JPEG_QUALITY;

use crate::command::{FfmpegCommand, ToolRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::file_size;
use crate::tools::MediaTools;

/// A thumbnail written to disk.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub processing_time_sec: f64,
}

/// Scale filter for a target width.
///
/// `-2` keeps the aspect ratio and rounds the height to an even value,
/// which H.264/JPEG chroma subsampling requires.
pub fn scale_filter(width: u32) -> String {
    format!("scale={}:-2", width)
}

/// Check a `HH:MM:SS` timestamp.
pub fn validate_timestamp(timestamp: &str) -> MediaResult<()> {
    let parts: Vec<&str> = timestamp.split(':').collect();
    let valid = parts.len() == 3
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit()))
        && parts[1] < "60"
        && parts[2] < "60";

    if valid {
        Ok(())
    } else {
        Err(MediaError::InvalidTimestamp(timestamp.to_string()))
    }
}

/// Default output path next to the video:
/// `{stem}_thumb_{HH-MM-SS}.jpg`.
pub fn thumbnail_path(video_path: &Path, timestamp: &str) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    let name = format!("{}_thumb_{}.jpg", stem, timestamp.replace(':', "-"));
    video_path.with_file_name(name)
}

/// Extract one frame at `timestamp`, scaled to `width`.
pub async fn generate_thumbnail(
    tools: &MediaTools,
    runner: &ToolRunner,
    video_path: impl AsRef<Path>,
    timestamp: &str,
    width: u32,
    output_path: impl AsRef<Path>,
) -> MediaResult<Thumbnail> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }
    validate_timestamp(timestamp)?;
    if width == 0 {
        return Err(MediaError::InvalidArgument(
            "thumbnail width must be positive".to_string(),
        ));
    }

    let cmd = FfmpegCommand::new(video_path, output_path)
        .seek(timestamp)
        .single_frame()
        .video_filter(scale_filter(width))
        .output_arg("-q:v")
        .output_arg(THUMBNAIL_JPEG_QUALITY.to_string());

    let output = runner.run_ffmpeg(&tools.ffmpeg, &cmd).await?;

    if !output_path.exists() {
        return Err(MediaError::malformed(format!(
            "FFmpeg exited successfully but {} was not created",
            output_path.display()
        )));
    }

    Ok(Thumbnail {
        path: output_path.to_path_buf(),
        size_bytes: file_size(output_path).await?,
        processing_time_sec: output.elapsed.as_secs_f64(),
    })
}
