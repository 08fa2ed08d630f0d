//! Batch form: run the pipeline once with fresh fetches and overwrite the
//! generated artifact. Scheduling is left to cron or CI.

use anyhow::{Context, Result};
use chrono::Utc;
use news_brief::config::PipelineConfig;
use news_brief::pipeline::{FetchMode, Pipeline};
use news_brief::present::write_artifact;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    news_brief::init_tracing();

    let cfg = PipelineConfig::from_env();
    let pipeline = Pipeline::from_config(&cfg, FetchMode::Fresh)?;

    let digest = pipeline.run(Utc::now()).await;
    write_artifact(&cfg.artifact_path, &digest)
        .with_context(|| format!("writing artifact to {}", cfg.artifact_path.display()))?;

    tracing::info!(
        articles = digest.article_count,
        brief = digest.daily_brief.len(),
        path = %cfg.artifact_path.display(),
        "generate_news done"
    );
    Ok(())
}
