//! Full-reference quality scoring with libvmaf.
//!
//! Not part of the per-job pipeline; used for offline validation of
//! encodes. Scoring is best-effort and reports failures in its outcome
//! instead of returning an error.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use mw_models::encoding::{VMAF_COMPARE_HEIGHT, VMAF_COMPARE_WIDTH};
use mw_models::{round2, QualityScore, QualityScoreOutcome};

use crate::command::{FfmpegCommand, ToolRunner};
use crate::error::{MediaError, MediaResult};
use crate::tools::MediaTools;

#[derive(Debug, Deserialize)]
struct VmafReport {
    #[serde(default)]
    frames: Vec<serde_json::Value>,
    pooled_metrics: PooledMetrics,
}

#[derive(Debug, Deserialize)]
struct PooledMetrics {
    vmaf: Metric,
    // libvmaf 1.x names vs 2.x names
    psnr: Option<Metric>,
    psnr_y: Option<Metric>,
    ssim: Option<Metric>,
    float_ssim: Option<Metric>,
}

#[derive(Debug, Deserialize)]
struct Metric {
    mean: f64,
}

/// Filter graph scaling both inputs and running libvmaf.
///
/// Input 0 is the encoded (distorted) file, input 1 the reference.
pub fn vmaf_filter(model_path: &Path, log_path: &Path) -> String {
    format!(
        "[0:v]scale={w}:{h}:flags=bicubic[distorted];\
         [1:v]scale={w}:{h}:flags=bicubic[ref];\
         [distorted][ref]libvmaf=model_path={model}:log_path={log}:log_fmt=json:\
         phone_model=1:psnr=1:ssim=1:ms_ssim=1",
        w = VMAF_COMPARE_WIDTH,
        h = VMAF_COMPARE_HEIGHT,
        model = model_path.display(),
        log = log_path.display(),
    )
}

/// Default report location: `{dir}/vmaf_{reference file name}.json`.
pub fn report_path(dir: &Path, reference: &Path) -> PathBuf {
    let name = reference
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "reference".to_string());
    dir.join(format!("vmaf_{}.json", name))
}

/// Compare `encoded` against `reference`.
pub async fn score(
    tools: &MediaTools,
    runner: &ToolRunner,
    reference: impl AsRef<Path>,
    encoded: impl AsRef<Path>,
    report: impl AsRef<Path>,
) -> QualityScoreOutcome {
    let reference = reference.as_ref();
    let encoded = encoded.as_ref();

    match try_score(tools, runner, reference, encoded, report.as_ref()).await {
        Ok(score) => {
            info!(
                "VMAF {:.2}/100, PSNR {:.2} dB, SSIM {:.4} ({} frames)",
                score.vmaf_score, score.psnr_score, score.ssim_score, score.frames_processed
            );
            QualityScoreOutcome::Scored(score)
        }
        Err(e) => {
            warn!("Quality scoring failed: {}", e);
            QualityScoreOutcome::Failed {
                error: e.to_string(),
                reference_file: reference.display().to_string(),
                encoded_file: encoded.display().to_string(),
            }
        }
    }
}

async fn try_score(
    tools: &MediaTools,
    runner: &ToolRunner,
    reference: &Path,
    encoded: &Path,
    report: &Path,
) -> MediaResult<QualityScore> {
    for path in [reference, encoded] {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
    }
    if let Some(parent) = report.parent() {
        fs::create_dir_all(parent).await?;
    }

    let cmd = FfmpegCommand::new(encoded, "-")
        .add_input(reference)
        .lavfi(vmaf_filter(&tools.vmaf_model, report))
        .null_output();
    runner.run_ffmpeg(&tools.ffmpeg, &cmd).await?;

    if !report.exists() {
        return Err(MediaError::malformed("VMAF report was not created"));
    }

    let json = fs::read(report).await?;
    let mut score = parse_vmaf_report(&json)?;
    score.model = tools
        .vmaf_model
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    score.reference_file = reference.display().to_string();
    score.encoded_file = encoded.display().to_string();
    score.json_report = report.display().to_string();
    Ok(score)
}

/// Read pooled means from a libvmaf JSON log.
///
/// File-related fields of the returned score are left empty.
pub fn parse_vmaf_report(json: &[u8]) -> MediaResult<QualityScore> {
    let report: VmafReport = serde_json::from_slice(json)
        .map_err(|e| MediaError::malformed(format!("invalid VMAF report: {}", e)))?;
    let pooled = report.pooled_metrics;

    let psnr = pooled.psnr.or(pooled.psnr_y).map(|m| m.mean).unwrap_or(0.0);
    let ssim = pooled.ssim.or(pooled.float_ssim).map(|m| m.mean).unwrap_or(0.0);

    Ok(QualityScore {
        vmaf_score: round2(pooled.vmaf.mean),
        psnr_score: round2(psnr),
        ssim_score: round2(ssim),
        model: String::new(),
        frames_processed: report.frames.len(),
        reference_file: String::new(),
        encoded_file: String::new(),
        json_report: String::new(),
    })
}
