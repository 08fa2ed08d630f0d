// src/lib.rs
// Public library surface shared by the server, the batch job, and integration tests.

pub mod api;
pub mod config;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod present;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::enrich::{EnrichedArticle, EnrichmentEngine, Level};
pub use crate::error::NewsError;
pub use crate::ingest::types::{FeedSource, RawItem};
pub use crate::pipeline::{FetchMode, Pipeline};
pub use crate::present::{DailyBriefItem, NewsDigest, NewsPayload, Stream, StreamLimits};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs filtered by `RUST_LOG` (default: this crate at info).
/// Safe to call when a subscriber is already installed.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_brief=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
