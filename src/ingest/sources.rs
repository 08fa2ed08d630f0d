// src/ingest/sources.rs
//! Source registry: the built-in feed catalog and an optional file override.

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::ingest::types::FeedSource;

/// Built-in catalog, grouped by category.
pub fn default_sources() -> Vec<FeedSource> {
    vec![
        // Tech
        FeedSource::new("Hacker News", "https://hnrss.org/frontpage", "Tech"),
        FeedSource::new("The Verge", "https://www.theverge.com/rss/index.xml", "Tech"),
        FeedSource::new(
            "Ars Technica",
            "https://feeds.arstechnica.com/arstechnica/technology-lab",
            "Tech",
        ),
        // World
        FeedSource::new("BBC World", "https://feeds.bbci.co.uk/news/world/rss.xml", "World"),
        FeedSource::new("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml", "World"),
        // India
        FeedSource::new(
            "The Hindu",
            "https://www.thehindu.com/news/national/feeder/default.rss",
            "India",
        ),
        FeedSource::new(
            "Indian Express",
            "https://indianexpress.com/section/india/feed/",
            "India",
        ),
        // Science
        FeedSource::new(
            "ScienceDaily",
            "https://www.sciencedaily.com/rss/top/science.xml",
            "Science",
        ),
        FeedSource::new("Nature", "https://www.nature.com/nature.rss", "Science"),
    ]
}

/// On-disk registry: `[[sources]]` tables in TOML; in JSON either a bare array
/// or an object with a `sources` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Wrapped { sources: Vec<FeedSource> },
    Bare(Vec<FeedSource>),
}

impl RegistryFile {
    fn into_sources(self) -> Vec<FeedSource> {
        match self {
            RegistryFile::Wrapped { sources } | RegistryFile::Bare(sources) => sources,
        }
    }
}

/// Read a registry override; the file extension selects the format.
pub fn load_sources_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    parse_registry(&content, ext.as_deref())
        .with_context(|| format!("parsing sources from {}", path.display()))
}

/// Explicit path wins (and must exist); otherwise the built-in catalog.
pub fn load_sources_default(path: Option<&Path>) -> Result<Vec<FeedSource>> {
    match path {
        Some(p) if p.exists() => load_sources_from(p),
        Some(p) => Err(anyhow!("sources path {} does not exist", p.display())),
        None => Ok(default_sources()),
    }
}

fn parse_registry(content: &str, ext: Option<&str>) -> Result<Vec<FeedSource>> {
    let file: RegistryFile = match ext {
        Some("toml") => toml::from_str(content)?,
        Some("json") => serde_json::from_str(content)?,
        // No usable extension: JSON first, then TOML.
        _ => match serde_json::from_str(content) {
            Ok(file) => file,
            Err(_) => toml::from_str(content).context("neither JSON nor TOML")?,
        },
    };
    Ok(clean_list(file.into_sources()))
}

/// Trim fields, drop incomplete entries, keep the first entry per URL.
fn clean_list(items: Vec<FeedSource>) -> Vec<FeedSource> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let src = FeedSource {
            name: it.name.trim().to_string(),
            url: it.url.trim().to_string(),
            category: it.category.trim().to_string(),
        };
        if src.name.is_empty() || src.url.is_empty() {
            continue;
        }
        if seen.insert(src.url.clone()) {
            out.push(src);
        }
    }
    out
}
