// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One remote feed in the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,     // e.g., "Hacker News"
    pub url: String,
    pub category: String, // e.g., "Tech", "World", "India", "Science"
}

impl FeedSource {
    pub fn new(name: &str, url: &str, category: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            category: category.to_string(),
        }
    }
}

/// One story as extracted from a feed body. `title` and `link` are never empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub pub_date: String, // raw, as found in the feed
    pub description: String,
    pub source: String,
    pub category: String,
}

/// Transport used by the fetcher. Separated so tests can swap in fixtures.
#[async_trait::async_trait]
pub trait FeedTransport: Send + Sync {
    /// GET `url` and return the body; non-success statuses are errors.
    async fn get_text(&self, url: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}
