// src/pipeline.rs
//! The one pipeline both invocation surfaces drive:
//! registry → fetch (fan-out) → extract → aggregate → enrich → assemble.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::gauge;

use crate::config::PipelineConfig;
use crate::enrich::EnrichmentEngine;
use crate::ingest::aggregate::aggregate;
use crate::ingest::fetcher::{FeedFetcher, HttpTransport};
use crate::ingest::fetch_all;
use crate::ingest::sources::load_sources_default;
use crate::ingest::types::FeedSource;
use crate::present::{assemble, NewsDigest, StreamLimits};

/// Everything a run needs; cheap to clone and share across requests.
#[derive(Clone)]
pub struct Pipeline {
    pub sources: Arc<Vec<FeedSource>>,
    pub fetcher: FeedFetcher,
    pub engine: EnrichmentEngine,
    pub limits: StreamLimits,
    pub run_deadline: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Batch job: every run hits the network.
    Fresh,
    /// On-demand handler: feed bodies reused within the cache window.
    Cached,
}

impl Pipeline {
    pub fn new(sources: Vec<FeedSource>, fetcher: FeedFetcher, engine: EnrichmentEngine) -> Self {
        Self {
            sources: Arc::new(sources),
            fetcher,
            engine,
            limits: StreamLimits::default(),
            run_deadline: None,
        }
    }

    pub fn with_limits(mut self, limits: StreamLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_run_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.run_deadline = deadline;
        self
    }

    /// Wire the production transport, registry and enrichment from config.
    pub fn from_config(cfg: &PipelineConfig, mode: FetchMode) -> Result<Self> {
        let sources = load_sources_default(cfg.sources_path.as_deref())?;
        let transport = Arc::new(
            HttpTransport::new(&cfg.user_agent, cfg.fetch_timeout).context("building feed http client")?,
        );
        let fetcher = match mode {
            FetchMode::Fresh => FeedFetcher::new(transport),
            FetchMode::Cached => FeedFetcher::with_cache(transport, cfg.cache_ttl),
        };
        let engine = EnrichmentEngine::from_config(&cfg.ai, &cfg.user_agent);

        tracing::info!(
            sources = sources.len(),
            ai_enabled = engine.is_ai_enabled(),
            fetch_mode = ?mode,
            "pipeline configured"
        );
        Ok(Self::new(sources, fetcher, engine).with_run_deadline(cfg.run_deadline))
    }

    pub async fn run(&self, now: DateTime<Utc>) -> NewsDigest {
        run(
            &self.sources,
            &self.fetcher,
            &self.engine,
            self.limits,
            self.run_deadline,
            now,
        )
        .await
    }
}

/// One best-effort run. Never fails: the worst case is an empty digest.
pub async fn run(
    sources: &[FeedSource],
    fetcher: &FeedFetcher,
    engine: &EnrichmentEngine,
    limits: StreamLimits,
    run_deadline: Option<Duration>,
    now: DateTime<Utc>,
) -> NewsDigest {
    let deadline = run_deadline.map(|d| tokio::time::Instant::now() + d);
    let raw = fetch_all(fetcher, sources, deadline).await;
    let working = aggregate(raw);
    let articles = engine.enrich(&working, now).await;
    tracing::info!(
        working_set = working.len(),
        enrichment = engine.mode_name(),
        "enrichment stage done"
    );

    gauge!("news_pipeline_last_run_ts").set(now.timestamp().max(0) as f64);
    assemble(&articles, limits, now)
}
