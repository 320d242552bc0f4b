use std::path::Path;

use mw_media::{resolve_tool, ToolRunner};
use mw_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "worker-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_tool("ffmpeg", &config.tools.ffmpeg, "-version").await?;
    ensure_tool("mediainfo", &config.tools.mediainfo, "--Version").await?;
    ensure_env_present(&["REDIS_URL"])?;

    let local = std::env::var("STORAGE_BACKEND")
        .map(|v| v.eq_ignore_ascii_case("local"))
        .unwrap_or(false);
    if !local {
        ensure_env_present(&[
            "S3_ENDPOINT_URL",
            "S3_ACCESS_KEY_ID",
            "S3_SECRET_ACCESS_KEY",
            "S3_BUCKET_NAME",
        ])?;
    }

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

async fn ensure_tool(name: &str, program: &Path, version_flag: &str) -> anyhow::Result<()> {
    let resolved = resolve_tool(name, program)?;
    ToolRunner::new()
        .with_timeout(std::time::Duration::from_secs(10))
        .run(name, &resolved, &[version_flag.to_string()])
        .await
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;
    println!("worker-selfcheck: {} found at {}", name, resolved.display());
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
