use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::config::{PRIORITY_RULES, TOPIC_RULES};
use crate::types::{FeedSource, NewsItem, Priority, RawEntry};

const MAX_TAGS: usize = 5;
const MAX_FEED_CATEGORIES: usize = 3;
const SUMMARY_CHARS: usize = 200;

const MISSING_TITLE: &str = "Untitled";
const MISSING_CONTENT: &str = "Full details are available at the original article link.";
const UNKNOWN_TIME: &str = "unknown";

/// Convert one raw feed entry into the canonical record.
pub fn normalize(entry: &RawEntry, source: &FeedSource, now: DateTime<Utc>) -> NewsItem {
    let title = entry
        .title
        .clone()
        .unwrap_or_else(|| MISSING_TITLE.to_string());
    let snippet = entry.snippet.as_deref().unwrap_or("");

    // Summary falls back from snippet to a truncated content body.
    let summary = match (&entry.snippet, &entry.content) {
        (Some(snippet), _) => snippet.clone(),
        (None, Some(content)) => content.chars().take(SUMMARY_CHARS).collect(),
        (None, None) => String::new(),
    };

    let content = entry
        .content
        .clone()
        .or_else(|| entry.snippet.clone())
        .unwrap_or_else(|| MISSING_CONTENT.to_string());

    let time = entry
        .published
        .map(|published| format_time_ago(published, now))
        .unwrap_or_else(|| UNKNOWN_TIME.to_string());

    NewsItem {
        id: generate_id(&title, &source.name),
        priority: classify_priority(&title, snippet),
        tags: extract_tags(entry),
        title,
        summary,
        content,
        region: source.region.clone(),
        time,
        related_history: Vec::new(),
        historical_summary: None,
        link: entry.link.clone(),
        source: source.name.clone(),
    }
}

/// Stable identity for a (title, source) pair: a 32-bit rolling
/// polynomial hash rendered in base-36. Recomputation is idempotent;
/// collisions across distinct pairs are an accepted limitation.
pub fn generate_id(title: &str, source: &str) -> String {
    let mut hash: i32 = 0;
    for ch in format!("{}-{}", title, source).chars() {
        hash = hash.wrapping_mul(31).wrapping_add(ch as i32);
    }
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    out.chars().rev().collect()
}

/// Classify against the ordered priority rule table; urgent rules are
/// checked before important ones and the first match wins.
pub fn classify_priority(title: &str, snippet: &str) -> Priority {
    let text = format!("{} {}", title, snippet).to_lowercase();
    for (priority, keywords) in PRIORITY_RULES {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return *priority;
        }
    }
    Priority::Normal
}

/// Render the age of an entry as a compact human label.
pub fn format_time_ago(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - published).num_minutes().max(0);
    if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}

/// Up to 3 feed-supplied categories verbatim, then any topic whose
/// keyword appears in the title. Deduplicated preserving first-seen
/// order, capped at 5.
pub fn extract_tags(entry: &RawEntry) -> Vec<String> {
    let mut tags: Vec<String> = entry
        .categories
        .iter()
        .take(MAX_FEED_CATEGORIES)
        .cloned()
        .collect();

    let lower_title = entry.title.as_deref().unwrap_or("").to_lowercase();
    for (topic, keywords) in TOPIC_RULES {
        if keywords.iter().any(|kw| lower_title.contains(kw)) {
            tags.push((*topic).to_string());
        }
    }

    let mut seen = HashSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
    tags.truncate(MAX_TAGS);
    tags
}
