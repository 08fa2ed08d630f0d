// tests/api_http.rs
//
// HTTP-level tests for the on-demand Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/news (payload shape, Cache-Control, feed cache window)
// - payload reuse: one pipeline run and one AI call per window

mod common;

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use news_brief::api::{self, AppState, CACHE_CONTROL};
use news_brief::enrich::gemini::TextGenerator;
use news_brief::enrich::EnrichmentEngine;
use news_brief::error::{NewsError, Result};
use news_brief::ingest::fetcher::FeedFetcher;
use news_brief::ingest::types::FeedTransport;
use news_brief::pipeline::Pipeline;
use news_brief::FeedSource;

use common::{TECH_XML, WORLD_XML};

const BODY_LIMIT: usize = 1024 * 1024;

/// Serves fixtures by URL suffix and counts network hits.
struct FixtureTransport {
    hits: AtomicUsize,
}

#[async_trait]
impl FeedTransport for FixtureTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if url.ends_with("tech.xml") {
            Ok(TECH_XML.to_string())
        } else if url.ends_with("world.xml") {
            Ok(WORLD_XML.to_string())
        } else {
            Err(NewsError::HttpStatus {
                url: url.to_string(),
                status: 500,
            })
        }
    }
    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Counts generate calls; answers with an empty array so every item falls back.
struct CountingGenerator {
    calls: AtomicUsize,
}

impl TextGenerator for CountingGenerator {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok("[]".to_string()) })
    }
    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

fn test_pipeline(transport: Arc<FixtureTransport>, engine: EnrichmentEngine) -> Pipeline {
    let fetcher = FeedFetcher::with_cache(transport, Duration::from_secs(3600));
    let sources = vec![
        FeedSource::new("TechWire", "http://feeds.test/tech.xml", "Tech"),
        FeedSource::new("Desk", "http://feeds.test/world.xml", "World"),
        FeedSource::new("Down", "http://feeds.test/down.xml", "Science"),
    ];
    Pipeline::new(sources, fetcher, engine)
}

fn test_router(transport: Arc<FixtureTransport>) -> Router {
    let pipeline = test_pipeline(transport, EnrichmentEngine::no_credential());
    api::router(AppState::new(pipeline))
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Option<String>, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let cache = resp
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v: Json = serde_json::from_slice(&bytes).expect("parse json");
    (status, cache, v)
}

#[tokio::test]
async fn api_health_returns_ok() {
    let app = test_router(Arc::new(FixtureTransport {
        hits: AtomicUsize::new(0),
    }));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn api_news_payload_contract() {
    let app = test_router(Arc::new(FixtureTransport {
        hits: AtomicUsize::new(0),
    }));
    let (status, cache, v) = get_json(&app, "/api/news").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some(CACHE_CONTROL));

    // Contract checks for UI consumers
    assert_eq!(v["success"], true);
    assert_eq!(v["articleCount"], 6);
    assert!(v["fetchedAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(v["streams"]["tech"]["articles"].as_array().unwrap().len(), 4);
    assert_eq!(v["streams"]["world"]["articles"].as_array().unwrap().len(), 2);
    assert_eq!(v["streams"]["longRead"]["id"], "long-read");
    assert!(v["streams"]["longRead"]["articles"].as_array().unwrap().is_empty());

    let brief = v["dailyBrief"].as_array().unwrap();
    assert_eq!(brief.len(), 3);
    for key in ["id", "headline", "context", "tags", "source", "sourceUrl", "publishedAt"] {
        assert!(brief[0].get(key).is_some(), "daily brief missing '{key}'");
    }
    assert!(brief[0].get("energyCost").is_none());

    let first = &v["streams"]["tech"]["articles"][0];
    assert_eq!(first["energyCost"], "Medium");
    assert_eq!(first["tags"], serde_json::json!(["Tech"]));
    assert!(first.get("impactLevel").is_none());
}

#[tokio::test]
async fn api_news_reuses_feed_bodies_within_cache_window() {
    let transport = Arc::new(FixtureTransport {
        hits: AtomicUsize::new(0),
    });
    let app = test_router(transport.clone());

    let (_, _, a) = get_json(&app, "/api/news").await;
    let after_first = transport.hits.load(Ordering::SeqCst);
    assert_eq!(after_first, 3);

    let (_, _, b) = get_json(&app, "/api/news").await;
    // Only the failing source is retried; the two good bodies are cached.
    assert_eq!(transport.hits.load(Ordering::SeqCst), after_first + 1);
    assert_eq!(a["articleCount"], b["articleCount"]);
}

#[tokio::test]
async fn api_news_reuses_payload_within_window() {
    let transport = Arc::new(FixtureTransport {
        hits: AtomicUsize::new(0),
    });
    let generator = Arc::new(CountingGenerator {
        calls: AtomicUsize::new(0),
    });
    let engine = EnrichmentEngine::with_generator(generator.clone());
    let state = AppState::new(test_pipeline(transport.clone(), engine))
        .with_payload_ttl(Duration::from_secs(3600));
    let app = api::router(state);

    // Two requests in flight together, then a third one later.
    let ((_, _, a), (_, _, b)) = tokio::join!(get_json(&app, "/api/news"), get_json(&app, "/api/news"));
    let (status, cache, c) = get_json(&app, "/api/news").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some(CACHE_CONTROL));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1, "one AI call per window");
    assert_eq!(transport.hits.load(Ordering::SeqCst), 3, "one pipeline run per window");
    assert_eq!(a["fetchedAt"], b["fetchedAt"]);
    assert_eq!(a["fetchedAt"], c["fetchedAt"]);
    assert_eq!(c["articleCount"], 6);
}

#[tokio::test]
async fn zero_payload_ttl_runs_every_request() {
    let transport = Arc::new(FixtureTransport {
        hits: AtomicUsize::new(0),
    });
    let generator = Arc::new(CountingGenerator {
        calls: AtomicUsize::new(0),
    });
    let engine = EnrichmentEngine::with_generator(generator.clone());
    let state = AppState::new(test_pipeline(transport, engine)).with_payload_ttl(Duration::ZERO);
    let app = api::router(state);

    get_json(&app, "/api/news").await;
    get_json(&app, "/api/news").await;
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}
