//! Per-job temporary resource tracking.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Records every local file or directory staged for one job and deletes
/// them all exactly once.
///
/// The job's scratch directory is removed last, which also catches partial
/// outputs a failed tool left behind. If [`cleanup`](Self::cleanup) was
/// never called, dropping the tracker runs it.
#[derive(Debug)]
pub struct TempResourceTracker {
    scratch_dir: Option<PathBuf>,
    paths: Vec<PathBuf>,
    cleaned: bool,
}

impl TempResourceTracker {
    /// Tracker for paths under `scratch_dir`.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: Some(scratch_dir.into()),
            paths: Vec::new(),
            cleaned: false,
        }
    }

    /// Tracker without a scratch directory of its own.
    pub fn detached() -> Self {
        Self {
            scratch_dir: None,
            paths: Vec::new(),
            cleaned: false,
        }
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!("Tracking {}", path.display());
        self.paths.push(path);
    }

    /// Tracked paths as strings, in staging order.
    pub fn attempted_files(&self) -> Vec<String> {
        self.paths.iter().map(|p| p.display().to_string()).collect()
    }

    pub fn is_cleaned(&self) -> bool {
        self.cleaned
    }

    /// Delete every tracked path in reverse order, then the scratch
    /// directory. Never fails; a second call does nothing.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.cleaned {
            return report;
        }
        self.cleaned = true;

        let scratch = self.scratch_dir.iter();
        for path in self.paths.iter().rev().chain(scratch) {
            match remove_path(path) {
                Ok(()) => {
                    debug!("Removed {}", path.display());
                    report.removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => report.missing += 1,
                Err(e) => {
                    warn!("Failed to remove {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

impl Drop for TempResourceTracker {
    fn drop(&mut self) {
        if !self.cleaned {
            let report = self.cleanup();
            debug!("Cleanup on drop: {:?}", report);
        }
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}
