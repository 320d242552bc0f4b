//! Offline VMAF/PSNR/SSIM comparison of an encode against its source.
//!
//! Usage: `quality-score <reference> <encoded> [report_dir]`
//!
//! Prints the outcome as JSON and exits non-zero when scoring failed.

use std::path::PathBuf;

use anyhow::bail;

use mw_worker::{init_tracing, QualityScoreRequest, QualityScoreStage, Stage, StageContext, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("mw_media=info,mw_worker=info");

    let mut args = std::env::args().skip(1);
    let (Some(reference), Some(encoded)) = (args.next(), args.next()) else {
        bail!("usage: quality-score <reference> <encoded> [report_dir]");
    };
    let report_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    let config = WorkerConfig::from_env();
    let ctx = StageContext::new(report_dir, config.max_processing_time);
    let stage = QualityScoreStage::new(config.tools);
    let request = QualityScoreRequest {
        reference: PathBuf::from(reference),
        encoded: PathBuf::from(encoded),
    };

    let outcome = ctx.within_budget(stage.run(&request, &ctx)).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Some(error) = outcome.error() {
        bail!("quality scoring failed: {}", error);
    }
    Ok(())
}
