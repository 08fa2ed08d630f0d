// src/ingest/fetcher.rs
//! Feed fetcher. Failures stay inside this module: a source that cannot be
//! fetched contributes an empty body and a log line, nothing else.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::error::{NewsError, Result};
use crate::ingest::types::{FeedSource, FeedTransport};

/// reqwest-backed transport with a custom user agent and per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NewsError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Absolute-TTL body cache keyed by URL (on-demand form only).
struct BodyCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl BodyCache {
    fn get(&self, url: &str) -> Option<String> {
        let g = self.entries.lock().ok()?;
        g.get(url)
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, body)| body.clone())
    }

    fn put(&self, url: &str, body: &str) {
        if let Ok(mut g) = self.entries.lock() {
            g.retain(|_, (at, _)| at.elapsed() < self.ttl);
            g.insert(url.to_string(), (Instant::now(), body.to_string()));
        }
    }
}

fn unavailable(source: &FeedSource, cause: &NewsError) -> NewsError {
    NewsError::SourceUnavailable {
        source_name: source.name.clone(),
        reason: cause.to_string(),
    }
}

#[derive(Clone)]
pub struct FeedFetcher {
    transport: Arc<dyn FeedTransport>,
    cache: Option<Arc<BodyCache>>,
}

impl FeedFetcher {
    /// Always fetches fresh (batch form).
    pub fn new(transport: Arc<dyn FeedTransport>) -> Self {
        Self {
            transport,
            cache: None,
        }
    }

    /// Reuses successful bodies for up to `ttl` (on-demand form).
    pub fn with_cache(transport: Arc<dyn FeedTransport>, ttl: Duration) -> Self {
        Self {
            transport,
            cache: Some(Arc::new(BodyCache {
                ttl,
                entries: Mutex::new(HashMap::new()),
            })),
        }
    }

    /// Fetch one source's body. Never fails: any error is logged and an empty
    /// body is returned so the source contributes no items.
    pub async fn fetch(&self, source: &FeedSource) -> String {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&source.url)) {
            counter!("news_fetch_cache_hits_total").increment(1);
            tracing::debug!(target: "ingest", source = %source.name, "feed cache hit");
            return hit;
        }

        let t0 = Instant::now();
        let res = self.transport.get_text(&source.url).await;
        histogram!("news_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(body) => {
                if let Some(c) = &self.cache {
                    c.put(&source.url, &body);
                }
                tracing::debug!(
                    target: "ingest",
                    source = %source.name,
                    bytes = body.len(),
                    transport = self.transport.name(),
                    "feed fetched"
                );
                body
            }
            Err(e) => {
                let err = unavailable(source, &e);
                tracing::warn!(target: "ingest", error = %err, url = %source.url, "feed fetch failed");
                counter!("news_fetch_errors_total").increment(1);
                String::new()
            }
        }
    }
}
