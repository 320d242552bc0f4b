//! External tool command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file paths, in `-i` order
    inputs: Vec<PathBuf>,
    /// Output target (a path, or `-` for the null muxer)
    output: String,
    /// Input arguments (before the first -i)
    input_args: Vec<String>,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            inputs: vec![input.as_ref().to_path_buf()],
            output: output.as_ref().to_string_lossy().to_string(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add another input file.
    pub fn add_input(mut self, input: impl AsRef<Path>) -> Self {
        self.inputs.push(input.as_ref().to_path_buf());
        self
    }

    /// Discard the encoded output (`-f null -`), for analysis filters.
    pub fn null_output(mut self) -> Self {
        self.output = "-".to_string();
        self.output_arg("-f").output_arg("null")
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Seek to a timestamp (before input).
    pub fn seek(self, timestamp: impl Into<String>) -> Self {
        self.input_arg("-ss").input_arg(timestamp)
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set complex filter graph.
    pub fn lavfi(self, filter: impl Into<String>) -> Self {
        self.output_arg("-lavfi").output_arg(filter)
    }

    /// Extract single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-vframes").output_arg("1")
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-hide_banner".to_string()];

        args.extend(self.input_args.iter().cloned());

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());

        if self.overwrite && self.output != "-" {
            args.push("-y".to_string());
        }

        args.push(self.output.clone());
        args
    }
}

/// Captured output of a finished tool process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Runs external tools with an optional kill deadline.
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    /// Hard ceiling on a single invocation
    timeout: Option<Duration>,
}

impl ToolRunner {
    /// Create a new runner without a deadline.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill the tool if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `program` with `args` and capture its output.
    ///
    /// `tool` is the display name used in errors. A non-zero exit becomes
    /// [`MediaError::ToolFailed`] carrying the full stderr.
    pub async fn run(&self, tool: &str, program: &Path, args: &[String]) -> MediaResult<ToolOutput> {
        if self.timeout == Some(Duration::ZERO) {
            return Err(MediaError::Timeout(0));
        }

        debug!("Running {}: {} {}", tool, program.display(), args.join(" "));

        let started = Instant::now();
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::ToolNotFound(format!("{} ({})", tool, program.display()))
                } else {
                    MediaError::Io(e)
                }
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!("{} timed out after {:?}, killing process", tool, limit);
                    return Err(MediaError::Timeout(limit.as_secs()));
                }
            },
            None => child.wait_with_output().await?,
        };

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            return Err(MediaError::tool_failed(tool, stderr, output.status.code()));
        }

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr,
            elapsed: started.elapsed(),
        })
    }

    /// Run an FFmpeg command.
    pub async fn run_ffmpeg(&self, ffmpeg: &Path, cmd: &FfmpegCommand) -> MediaResult<ToolOutput> {
        self.run("FFmpeg", ffmpeg, &cmd.build_args()).await
    }
}

/// Locate a configured tool, searching `PATH` when `program` is a bare name.
pub fn resolve_tool(tool: &str, program: &Path) -> MediaResult<PathBuf> {
    which::which(program)
        .map_err(|_| MediaError::ToolNotFound(format!("{} ({})", tool, program.display())))
}
