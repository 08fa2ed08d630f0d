// src/enrich/mod.rs
//! Enrichment engine: one batched generative call over the working set, with a
//! deterministic synthesis used whenever the call is disabled or unusable.

pub mod gemini;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ai::AiConfig;
use crate::enrich::gemini::{GeminiClient, TextGenerator};
use crate::error::{NewsError, Result};
use crate::ingest::aggregate::parse_pub_date;
use crate::ingest::types::RawItem;

pub const PLACEHOLDER_CONTEXT: &str = "No description available.";
pub const DEFAULT_HYPE_SCORE: u8 = 5;

/// Topic tags the model is asked to choose from; mirrors the stream allow-lists.
const TAG_VOCABULARY: &str = "Tech, AI, CS, Frontend, Security, LLMs, Infosec, World, India, \
Policy, Economy, Fintech, Business, Science, Biology, Physics, History, Research";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn parse(s: &str) -> Option<Level> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Level::Low),
            "medium" | "med" => Some(Level::Medium),
            "high" => Some(Level::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepContent {
    pub explanation: String,
    pub bias_indicator: String,
    pub hype_score: u8,
    pub credible_source_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedArticle {
    pub id: String,
    pub headline: String,
    pub context: String,
    pub tags: Vec<String>,
    pub source: String,
    pub source_url: String,
    /// `YYYY-MM-DD`
    pub published_at: String,
    pub energy_cost: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_content: Option<DeepContent>,
}

/// Per-headline analysis as returned by the model. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Analysis {
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    energy_cost: Option<String>,
    #[serde(default)]
    impact_level: Option<String>,
    #[serde(default)]
    bias_indicator: Option<String>,
    #[serde(default)]
    hype_score: Option<Value>,
}

/// Which enrichment path a run takes. `NoCredential` never touches the network.
#[derive(Clone)]
pub enum EnrichmentMode {
    NoCredential,
    Ai(Arc<dyn TextGenerator>),
}

#[derive(Clone)]
pub struct EnrichmentEngine {
    mode: EnrichmentMode,
}

impl EnrichmentEngine {
    pub fn no_credential() -> Self {
        Self {
            mode: EnrichmentMode::NoCredential,
        }
    }

    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            mode: EnrichmentMode::Ai(generator),
        }
    }

    /// Gemini when a credential is configured, otherwise `NoCredential`.
    pub fn from_config(cfg: &AiConfig, user_agent: &str) -> Self {
        match GeminiClient::from_config(cfg, user_agent) {
            Ok(Some(client)) => Self::with_generator(Arc::new(client)),
            Ok(None) => Self::no_credential(),
            Err(e) => {
                tracing::warn!(target: "enrich", error = %e, "AI client init failed; enrichment disabled");
                Self::no_credential()
            }
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match &self.mode {
            EnrichmentMode::NoCredential => "no-credential",
            EnrichmentMode::Ai(g) => g.provider_name(),
        }
    }

    pub fn is_ai_enabled(&self) -> bool {
        matches!(self.mode, EnrichmentMode::Ai(_))
    }

    /// Produce one article per input item, same order.
    pub async fn enrich(&self, items: &[RawItem], now: DateTime<Utc>) -> Vec<EnrichedArticle> {
        let run_ts = now.timestamp_millis();

        let generator = match &self.mode {
            EnrichmentMode::Ai(g) if !items.is_empty() => g,
            _ => return synthesize_all(items, run_ts, now),
        };

        let prompt = build_prompt(items);
        let analyses = match generator.generate(&prompt).await.and_then(|t| decode_analyses(&t)) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    target: "enrich",
                    error = %e,
                    provider = generator.provider_name(),
                    items = items.len(),
                    "enrichment unavailable; using fallback for whole batch"
                );
                return synthesize_all(items, run_ts, now);
            }
        };

        if analyses.len() != items.len() {
            tracing::warn!(
                target: "enrich",
                expected = items.len(),
                got = analyses.len(),
                "analysis count differs from headline count; alignment is positional"
            );
        }

        let mut out = Vec::with_capacity(items.len());
        let (mut ai, mut fallback) = (0u64, 0u64);
        for (idx, item) in items.iter().enumerate() {
            let analysis = analyses
                .get(idx)
                .cloned()
                .and_then(|v| serde_json::from_value::<Analysis>(v).ok());
            match analysis {
                Some(a) => {
                    ai += 1;
                    out.push(apply_analysis(item, a, idx, run_ts, now));
                }
                None => {
                    fallback += 1;
                    tracing::debug!(target: "enrich", index = idx, "no usable analysis; item falls back");
                    out.push(synthesize(item, idx, run_ts, now));
                }
            }
        }
        counter!("news_enrichment_ai_total").increment(ai);
        counter!("news_enrichment_fallback_total").increment(fallback);
        out
    }
}

/// One prompt for the whole batch: `[source] title` per line plus the output contract.
pub fn build_prompt(items: &[RawItem]) -> String {
    let headlines: Vec<String> = items
        .iter()
        .map(|it| format!("[{}] {}", it.source, it.title))
        .collect();

    format!(
        "You are a news analyst for a personal dashboard. Analyze each headline below.\n\n\
         Headlines:\n{}\n\n\
         Return ONLY a JSON array with exactly {} objects, one per headline, in the same order. \
         Each object must have these fields:\n\
         - \"context\": one or two sentences on why the story matters\n\
         - \"tags\": 1-3 tags chosen from: {}\n\
         - \"energyCost\": \"Low\", \"Medium\" or \"High\" (effort needed to read it)\n\
         - \"impactLevel\": \"Low\", \"Medium\" or \"High\"\n\
         - \"biasIndicator\": a short note on framing or bias, or \"\" if none\n\
         - \"hypeScore\": integer from 1 (sober) to 10 (pure hype)\n\
         No markdown, no commentary.",
        headlines.join("\n"),
        items.len(),
        TAG_VOCABULARY
    )
}

/// Contents of the first markdown code fence anywhere in the text, or the whole
/// text trimmed when there is none.
pub fn strip_code_fences(text: &str) -> &str {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap());
    match re.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim(),
        None => text.trim(),
    }
}

/// Decode the model text as a JSON array; elements are validated per item later.
fn decode_analyses(text: &str) -> Result<Vec<Value>> {
    let body = strip_code_fences(text);
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(v)) => Ok(v),
        Ok(_) => Err(NewsError::Decode("expected a JSON array".into())),
        Err(e) => Err(NewsError::Decode(e.to_string())),
    }
}

fn article_id(run_ts: i64, idx: usize) -> String {
    format!("rss-{run_ts}-{idx}")
}

fn published_day(item: &RawItem, now: DateTime<Utc>) -> String {
    parse_pub_date(&item.pub_date)
        .unwrap_or(now)
        .format("%Y-%m-%d")
        .to_string()
}

fn fallback_context(item: &RawItem) -> String {
    if item.description.trim().is_empty() {
        PLACEHOLDER_CONTEXT.to_string()
    } else {
        item.description.clone()
    }
}

/// Deterministic article: description as context, category as the only tag.
pub fn synthesize(item: &RawItem, idx: usize, run_ts: i64, now: DateTime<Utc>) -> EnrichedArticle {
    EnrichedArticle {
        id: article_id(run_ts, idx),
        headline: item.title.clone(),
        context: fallback_context(item),
        tags: vec![item.category.clone()],
        source: item.source.clone(),
        source_url: item.link.clone(),
        published_at: published_day(item, now),
        energy_cost: Level::Medium,
        impact_level: None,
        deep_content: None,
    }
}

fn synthesize_all(items: &[RawItem], run_ts: i64, now: DateTime<Utc>) -> Vec<EnrichedArticle> {
    counter!("news_enrichment_fallback_total").increment(items.len() as u64);
    items
        .iter()
        .enumerate()
        .map(|(idx, it)| synthesize(it, idx, run_ts, now))
        .collect()
}

fn clean_tags(raw: Option<Vec<String>>, category: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in raw.unwrap_or_default() {
        let t = t.trim();
        if !t.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(t)) {
            out.push(t.to_string());
        }
    }
    if out.is_empty() {
        out.push(category.to_string());
    }
    out
}

fn hype_score(v: Option<&Value>) -> u8 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(x) if x.is_finite() => x.round().clamp(1.0, 10.0) as u8,
        _ => DEFAULT_HYPE_SCORE,
    }
}

fn apply_analysis(
    item: &RawItem,
    a: Analysis,
    idx: usize,
    run_ts: i64,
    now: DateTime<Utc>,
) -> EnrichedArticle {
    let context = a
        .context
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| fallback_context(item));

    let deep_content = a
        .bias_indicator
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .map(|bias| DeepContent {
            explanation: context.clone(),
            bias_indicator: bias,
            hype_score: hype_score(a.hype_score.as_ref()),
            credible_source_note: format!("Reported by {}.", item.source),
        });

    EnrichedArticle {
        id: article_id(run_ts, idx),
        headline: item.title.clone(),
        context,
        tags: clean_tags(a.tags, &item.category),
        source: item.source.clone(),
        source_url: item.link.clone(),
        published_at: published_day(item, now),
        energy_cost: a
            .energy_cost
            .as_deref()
            .and_then(Level::parse)
            .unwrap_or(Level::Medium),
        impact_level: a.impact_level.as_deref().and_then(Level::parse),
        deep_content,
    }
}
