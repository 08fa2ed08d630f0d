// src/present.rs
//! Presentation assembler: topic streams + daily brief, and the two ways of
//! emitting them (generated artifact for the batch job, JSON payload for the
//! on-demand handler). Both serialize the same `NewsDigest`.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::enrich::EnrichedArticle;
use crate::error::{NewsError, Result};

pub const DAILY_BRIEF_LEN: usize = 3;

pub const TECH_TAGS: &[&str] = &["Tech", "AI", "CS", "Frontend", "Security", "LLMs", "Infosec"];
pub const WORLD_TAGS: &[&str] = &["World", "India", "Policy", "Economy", "Fintech", "Business"];
pub const SCIENCE_TAGS: &[&str] = &["Science", "Biology", "Physics", "History", "Research"];

/// Per-stream caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimits {
    pub tech: usize,
    pub world: usize,
    pub long_read: usize,
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self {
            tech: 10,
            world: 8,
            long_read: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: String,
    pub title: String,
    pub articles: Vec<EnrichedArticle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBriefItem {
    pub id: String,
    pub headline: String,
    pub context: String,
    pub tags: Vec<String>,
    pub source: String,
    pub source_url: String,
    pub published_at: String,
}

impl From<&EnrichedArticle> for DailyBriefItem {
    fn from(a: &EnrichedArticle) -> Self {
        Self {
            id: a.id.clone(),
            headline: a.headline.clone(),
            context: a.context.clone(),
            tags: a.tags.clone(),
            source: a.source.clone(),
            source_url: a.source_url.clone(),
            published_at: a.published_at.clone(),
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsDigest {
    pub generated_at: DateTime<Utc>,
    pub article_count: usize,
    pub tech: Stream,
    pub world: Stream,
    pub long_read: Stream,
    pub daily_brief: Vec<DailyBriefItem>,
}

fn has_any_tag(article: &EnrichedArticle, allow: &[&str]) -> bool {
    article
        .tags
        .iter()
        .any(|t| allow.iter().any(|a| a.eq_ignore_ascii_case(t.trim())))
}

fn build_stream(
    id: &str,
    title: &str,
    articles: &[EnrichedArticle],
    allow: &[&str],
    cap: usize,
) -> Stream {
    Stream {
        id: id.to_string(),
        title: title.to_string(),
        articles: articles
            .iter()
            .filter(|a| has_any_tag(a, allow))
            .take(cap)
            .cloned()
            .collect(),
    }
}

/// Partition (non-exclusively) into streams and take the daily brief.
/// `articles` must already be in aggregator order.
pub fn assemble(
    articles: &[EnrichedArticle],
    limits: StreamLimits,
    generated_at: DateTime<Utc>,
) -> NewsDigest {
    let digest = NewsDigest {
        generated_at,
        article_count: articles.len(),
        tech: build_stream("tech", "Tech & AI", articles, TECH_TAGS, limits.tech),
        world: build_stream("world", "World & India", articles, WORLD_TAGS, limits.world),
        long_read: build_stream(
            "long-read",
            "Science & Long Reads",
            articles,
            SCIENCE_TAGS,
            limits.long_read,
        ),
        daily_brief: articles
            .iter()
            .take(DAILY_BRIEF_LEN)
            .map(DailyBriefItem::from)
            .collect(),
    };
    tracing::info!(
        target: "present",
        articles = digest.article_count,
        tech = digest.tech.articles.len(),
        world = digest.world.articles.len(),
        long_read = digest.long_read.articles.len(),
        brief = digest.daily_brief.len(),
        "digest assembled"
    );
    digest
}

// ------------------------------------------------------------
// On-demand payload
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamsPayload {
    pub tech: Stream,
    pub world: Stream,
    pub long_read: Stream,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPayload {
    pub success: bool,
    /// ISO-8601 timestamp of the run.
    pub fetched_at: String,
    pub article_count: usize,
    pub streams: StreamsPayload,
    pub daily_brief: Vec<DailyBriefItem>,
}

impl From<&NewsDigest> for NewsPayload {
    fn from(d: &NewsDigest) -> Self {
        Self {
            success: true,
            fetched_at: d.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            article_count: d.article_count,
            streams: StreamsPayload {
                tech: d.tech.clone(),
                world: d.world.clone(),
                long_read: d.long_read.clone(),
            },
            daily_brief: d.daily_brief.clone(),
        }
    }
}

// ------------------------------------------------------------
// Batch artifact
// ------------------------------------------------------------

fn pretty<T: Serialize>(v: &T) -> Result<String> {
    serde_json::to_string_pretty(v).map_err(|e| NewsError::Decode(e.to_string()))
}

/// Render the digest as a generated TypeScript module.
pub fn render_artifact(d: &NewsDigest) -> Result<String> {
    let mut out = format!(
        "// Auto-generated by generate_news on {}. Do not edit.\n\n",
        d.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    out.push_str(&format!("export const techStream = {};\n\n", pretty(&d.tech)?));
    out.push_str(&format!("export const worldStream = {};\n\n", pretty(&d.world)?));
    out.push_str(&format!("export const longReadStream = {};\n\n", pretty(&d.long_read)?));
    out.push_str(&format!("export const dailyBrief = {};\n", pretty(&d.daily_brief)?));
    Ok(out)
}

/// Overwrite `path` with the rendered artifact (temp file + rename).
pub fn write_artifact(path: &Path, d: &NewsDigest) -> Result<()> {
    let content = render_artifact(d)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if let Ok(prev) = fs::metadata(path) {
        tracing::info!(target: "present", path = %path.display(), previous_bytes = prev.len(), "replacing previous artifact");
    }
    let tmp = path.with_extension("tmp");
    let mut f = fs::File::create(&tmp)?;
    f.write_all(content.as_bytes())?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    tracing::info!(target: "present", path = %path.display(), bytes = content.len(), "artifact written");
    Ok(())
}
