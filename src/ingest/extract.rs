// src/ingest/extract.rs
//! Tolerant item extraction. Feeds are not assumed to be well-formed XML, so
//! this scans for `<item>` blocks with regexes instead of running a parser.

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::NewsError;
use crate::ingest::types::{FeedSource, RawItem};

/// Per-feed cap on item blocks considered.
pub const MAX_ITEMS_PER_FEED: usize = 5;
/// Description length cap, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 300;

fn item_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<item(?:\s[^>]*)?>(.*?)</item\s*>").unwrap())
}

// The regex crate has no backreferences, so each field gets its own pattern.
fn field_re(tag: &str) -> Regex {
    let t = regex::escape(tag);
    Regex::new(&format!(
        r"(?is)<{t}(?:\s[^>]*)?>\s*(?:<!\[CDATA\[(.*?)\]\]>|(.*?))\s*</{t}\s*>"
    ))
    .unwrap()
}

fn title_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| field_re("title"))
}

fn link_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| field_re("link"))
}

fn pub_date_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| field_re("pubDate"))
}

fn dc_date_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| field_re("dc:date"))
}

fn description_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| field_re("description"))
}

/// First match of `re` in `block` with CDATA sections unwrapped; empty when absent.
fn capture_field(re: &Regex, block: &str) -> String {
    re.captures(block)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| unwrap_cdata(m.as_str()))
        .unwrap_or_default()
}

/// Replace every `<![CDATA[...]]>` section with its inner text.
fn unwrap_cdata(s: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
    re.replace_all(s, "$1").into_owned()
}

// A tag opens with a letter, `/` or `!`, so a bare `3 < 5` survives.
fn strip_tags(s: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)<[/!]?[A-Za-z!][^>]*>").unwrap());
    re.replace_all(s, " ").into_owned()
}

fn collapse_ws(s: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"\s+").unwrap());
    re.replace_all(s, " ").trim().to_string()
}

/// Description cleanup: escaped HTML is the norm there, so decode entities
/// first, then drop tags and collapse whitespace.
pub fn strip_markup(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    collapse_ws(&strip_tags(&decoded))
}

/// Title cleanup: titles are plain text, so only real tags are dropped and
/// entities are decoded afterwards.
pub fn plain_text(s: &str) -> String {
    let no_tags = strip_tags(s);
    collapse_ws(&html_escape::decode_html_entities(&no_tags))
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}

/// Extract at most [`MAX_ITEMS_PER_FEED`] items from a feed body.
/// A body without item blocks yields an empty vector.
pub fn extract_items(body: &str, source: &FeedSource) -> Vec<RawItem> {
    let mut out = Vec::with_capacity(MAX_ITEMS_PER_FEED);
    let mut blocks = 0usize;

    for caps in item_re().captures_iter(body).take(MAX_ITEMS_PER_FEED) {
        blocks += 1;
        let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

        let title = plain_text(&capture_field(title_re(), block));
        let link = html_escape::decode_html_entities(capture_field(link_re(), block).trim())
            .trim()
            .to_string();
        let mut pub_date = capture_field(pub_date_re(), block).trim().to_string();
        if pub_date.is_empty() {
            pub_date = capture_field(dc_date_re(), block).trim().to_string();
        }
        let description = truncate_chars(
            &strip_markup(&capture_field(description_re(), block)),
            MAX_DESCRIPTION_CHARS,
        );

        if title.is_empty() || link.is_empty() {
            tracing::debug!(target: "ingest", source = %source.name, "item without title/link dropped");
            continue;
        }

        out.push(RawItem {
            title,
            link,
            pub_date,
            description,
            source: source.name.clone(),
            category: source.category.clone(),
        });
    }

    if blocks == 0 && !body.is_empty() {
        let err = NewsError::MalformedFeed {
            source_name: source.name.clone(),
        };
        tracing::warn!(target: "ingest", error = %err, "feed yielded no items");
    }
    counter!("news_items_extracted_total").increment(out.len() as u64);
    out
}
