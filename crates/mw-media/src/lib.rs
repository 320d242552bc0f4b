//! FFmpeg and MediaInfo CLI wrappers for the media worker.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A tool runner with a kill deadline and full stderr capture
//! - Thumbnail extraction, HLS transcoding and bundle inspection
//! - MediaInfo metadata probing
//! - VMAF quality scoring for offline validation

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod hls;
pub mod probe;
pub mod thumbnail;
pub mod tools;
pub mod vmaf;

pub use command::{resolve_tool, FfmpegCommand, ToolOutput, ToolRunner};
pub use error::{MediaError, MediaResult};
pub use hls::{transcode_to_hls, HlsBundle};
pub use probe::probe_metadata;
pub use thumbnail::{generate_thumbnail, thumbnail_path, Thumbnail};
pub use tools::MediaTools;
