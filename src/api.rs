// src/api.rs
//! On-demand surface: runs the pipeline and returns the JSON payload. With a
//! payload TTL set, one assembled payload serves every request in the window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use metrics::counter;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::pipeline::Pipeline;
use crate::present::NewsPayload;

pub const CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=600";

/// Last assembled payload. The lock is held across a refresh, so concurrent
/// requests in an expired window wait for one run instead of starting their own.
struct PayloadCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, NewsPayload)>>,
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    payload: Option<Arc<PayloadCache>>,
}

impl AppState {
    /// Runs the pipeline on every request.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            payload: None,
        }
    }

    /// Reuse the assembled payload for `ttl`; zero disables reuse.
    pub fn with_payload_ttl(mut self, ttl: Duration) -> Self {
        self.payload = (!ttl.is_zero()).then(|| {
            Arc::new(PayloadCache {
                ttl,
                slot: Mutex::new(None),
            })
        });
        self
    }

    async fn fresh_payload(&self) -> NewsPayload {
        let digest = self.pipeline.run(Utc::now()).await;
        NewsPayload::from(&digest)
    }

    async fn payload(&self) -> NewsPayload {
        let Some(cache) = &self.payload else {
            return self.fresh_payload().await;
        };

        let mut slot = cache.slot.lock().await;
        if let Some((at, payload)) = slot.as_ref() {
            if at.elapsed() < cache.ttl {
                counter!("news_payload_cache_hits_total").increment(1);
                return payload.clone();
            }
        }
        let payload = self.fresh_payload().await;
        *slot = Some((Instant::now(), payload.clone()));
        payload
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news", get(news))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn news(State(state): State<AppState>) -> impl IntoResponse {
    let payload = state.payload().await;
    tracing::info!(articles = payload.article_count, "news payload served");
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL))],
        Json(payload),
    )
}
