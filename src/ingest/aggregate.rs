// src/ingest/aggregate.rs
//! Merge per-source items, newest first, capped to a working set.

use chrono::{DateTime, Utc};

use crate::ingest::types::RawItem;

/// Working-set cap after merging all sources.
pub const MAX_AGGREGATED_ITEMS: usize = 30;

/// Parse a feed date (RFC 2822 as in RSS, or RFC 3339 as in dc:date/Atom).
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Sort by `pub_date` descending and keep the first [`MAX_AGGREGATED_ITEMS`].
/// Unparseable dates sort last; ties keep arrival order. No deduplication.
pub fn aggregate(items: Vec<RawItem>) -> Vec<RawItem> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, RawItem)> = items
        .into_iter()
        .map(|it| (parse_pub_date(&it.pub_date), it))
        .collect();

    // `None < Some(_)`, so descending order puts undated items at the end.
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.truncate(MAX_AGGREGATED_ITEMS);
    keyed.into_iter().map(|(_, it)| it).collect()
}
