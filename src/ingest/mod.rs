// src/ingest/mod.rs
pub mod aggregate;
pub mod extract;
pub mod fetcher;
pub mod sources;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::ingest::extract::extract_items;
use crate::ingest::fetcher::FeedFetcher;
use crate::ingest::types::{FeedSource, RawItem};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_errors_total", "Feed fetch failures (network or status).");
        describe_counter!("news_fetch_cache_hits_total", "Feed bodies served from the TTL cache.");
        describe_counter!("news_payload_cache_hits_total", "On-demand payloads served without a pipeline run.");
        describe_counter!("news_items_extracted_total", "Raw items extracted from feed bodies.");
        describe_histogram!("news_fetch_ms", "Per-feed fetch time in milliseconds.");
        describe_counter!("news_enrichment_ai_total", "Articles enriched from the AI response.");
        describe_counter!(
            "news_enrichment_fallback_total",
            "Articles built by deterministic fallback."
        );
        describe_gauge!("news_pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Fetch and extract every source concurrently, then join.
///
/// Results are concatenated in registry order regardless of completion order.
/// With a `deadline`, sources still in flight when it passes contribute nothing.
pub async fn fetch_all(
    fetcher: &FeedFetcher,
    sources: &[FeedSource],
    deadline: Option<Instant>,
) -> Vec<RawItem> {
    ensure_metrics_described();

    let mut set = JoinSet::new();
    for (idx, src) in sources.iter().cloned().enumerate() {
        let fetcher = fetcher.clone();
        set.spawn(async move {
            let body = match deadline {
                Some(at) => match tokio::time::timeout_at(at, fetcher.fetch(&src)).await {
                    Ok(body) => body,
                    Err(_) => {
                        tracing::warn!(target: "ingest", source = %src.name, "run deadline reached; source omitted");
                        String::new()
                    }
                },
                None => fetcher.fetch(&src).await,
            };
            (idx, extract_items(&body, &src))
        });
    }

    let mut per_source: Vec<Vec<RawItem>> = vec![Vec::new(); sources.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, items)) => per_source[idx] = items,
            Err(e) => tracing::warn!(target: "ingest", error = %e, "fetch task aborted"),
        }
    }

    let raw: Vec<RawItem> = per_source.into_iter().flatten().collect();
    tracing::info!(target: "ingest", sources = sources.len(), items = raw.len(), "fetch stage joined");
    raw
}
