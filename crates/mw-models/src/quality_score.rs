//! Full-reference quality score reports.

use serde::{Deserialize, Serialize};

/// Pooled VMAF/PSNR/SSIM scores comparing an encode against its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Perceptual score, 0-100
    pub vmaf_score: f64,
    /// dB
    pub psnr_score: f64,
    pub ssim_score: f64,
    /// VMAF model file name
    pub model: String,
    pub frames_processed: usize,
    pub reference_file: String,
    pub encoded_file: String,
    /// Path of the per-frame JSON log
    pub json_report: String,
}

/// Result of a best-effort scoring run.
///
/// Scoring never propagates errors: callers inspect the variant instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QualityScoreOutcome {
    Scored(QualityScore),
    Failed {
        error: String,
        reference_file: String,
        encoded_file: String,
    },
}

impl QualityScoreOutcome {
    pub fn score(&self) -> Option<&QualityScore> {
        match self {
            QualityScoreOutcome::Scored(s) => Some(s),
            QualityScoreOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QualityScoreOutcome::Scored(_) => None,
            QualityScoreOutcome::Failed { error, .. } => Some(error),
        }
    }
}
