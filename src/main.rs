//! News service binary entrypoint (on-demand form).
//! Boots the Axum HTTP server serving `GET /api/news` plus `/metrics`.

use news_brief::api::{self, AppState};
use news_brief::config::PipelineConfig;
use news_brief::metrics::Metrics;
use news_brief::pipeline::{FetchMode, Pipeline};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    news_brief::init_tracing();

    let cfg = PipelineConfig::from_env();
    tracing::info!(
        ai_credential = cfg.ai.credential.is_present(),
        cache_ttl_secs = cfg.cache_ttl.as_secs(),
        "starting news service"
    );

    let pipeline = Pipeline::from_config(&cfg, FetchMode::Cached)?;
    let metrics = Metrics::init()?;

    let state = AppState::new(pipeline).with_payload_ttl(cfg.cache_ttl);
    let router = api::router(state).merge(metrics.router());
    Ok(router.into())
}
