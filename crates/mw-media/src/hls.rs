//! HLS transcoding and bundle inspection.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use mw_models::encoding::{MASTER_PLAYLIST_NAME, SEGMENT_EXTENSION};
use mw_models::{HlsEncoding, QualityProfile};

use crate::command::{FfmpegCommand, ToolRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{files_with_extension, total_size};
use crate::tools::MediaTools;

/// A playlist and its segments, all in one directory.
#[derive(Debug, Clone)]
pub struct HlsBundle {
    pub dir: PathBuf,
    pub master_playlist: PathBuf,
    /// Segment files, sorted by name
    pub segments: Vec<PathBuf>,
    /// Combined size of the segments in bytes
    pub total_size_bytes: u64,
}

impl HlsBundle {
    /// Inspect a bundle directory after transcoding.
    ///
    /// Fails with [`MediaError::MalformedOutput`] when the playlist is missing.
    pub async fn scan(dir: impl AsRef<Path>) -> MediaResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let master_playlist = dir.join(MASTER_PLAYLIST_NAME);

        if !master_playlist.exists() {
            return Err(MediaError::malformed(format!(
                "HLS playlist was not created: {}",
                master_playlist.display()
            )));
        }

        let segments = files_with_extension(&dir, SEGMENT_EXTENSION).await?;
        let total_size_bytes = total_size(&segments).await?;

        Ok(Self {
            dir,
            master_playlist,
            segments,
            total_size_bytes,
        })
    }

    pub fn segments_count(&self) -> usize {
        self.segments.len()
    }

    /// Every file to publish: segments first, playlist last.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = self.segments.clone();
        files.push(self.master_playlist.clone());
        files
    }

    /// Check that the playlist exists and every segment it references is
    /// on disk.
    pub async fn verify(&self) -> MediaResult<()> {
        let content = fs::read_to_string(&self.master_playlist).await.map_err(|e| {
            MediaError::malformed(format!(
                "cannot read playlist {}: {}",
                self.master_playlist.display(),
                e
            ))
        })?;

        let missing: Vec<String> = playlist_entries(&content)
            .into_iter()
            .filter(|entry| !self.dir.join(entry).exists())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MediaError::malformed(format!(
                "playlist references missing segments: {}",
                missing.join(", ")
            )))
        }
    }
}

/// URIs referenced by an M3U8 playlist (non-empty, non-tag lines).
pub fn playlist_entries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Transcode `video_path` into an HLS bundle in `output_dir`.
///
/// The quality label is resolved before anything else so that an unknown
/// label never reaches FFmpeg.
pub async fn transcode_to_hls(
    tools: &MediaTools,
    runner: &ToolRunner,
    encoding: &HlsEncoding,
    video_path: impl AsRef<Path>,
    quality: &str,
    output_dir: impl AsRef<Path>,
) -> MediaResult<HlsBundle> {
    let profile = QualityProfile::lookup(quality)?;
    let video_path = video_path.as_ref();
    let output_dir = output_dir.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    fs::create_dir_all(output_dir).await?;
    let master_playlist = output_dir.join(MASTER_PLAYLIST_NAME);

    let cmd = FfmpegCommand::new(video_path, &master_playlist)
        .output_args(encoding.to_ffmpeg_args(profile));

    let output = runner.run_ffmpeg(&tools.ffmpeg, &cmd).await?;
    debug!(
        "Transcoded {} to {} in {:.2}s",
        video_path.display(),
        profile.label,
        output.elapsed.as_secs_f64()
    );

    HlsBundle::scan(output_dir).await
}
