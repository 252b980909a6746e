use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured RSS endpoint with its geographic region tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub region: String,
}

/// Transient per-entry structure surfaced by feed parsing.
/// Consumed immediately by the normalizer; carries no identity.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub content: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
}

/// Priority classification assigned once at normalization time.
/// Variant order doubles as sort order: urgent items sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    Important,
    Normal,
}

/// A model-generated historical analogue. All fields are display text;
/// `year` is kept as a string and never parsed numerically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub year: String,
    pub title: String,
    pub description: String,
    pub significance: String,
}

/// Result of enriching one item. The default (all-empty) value is the
/// explicit "no result" marker for failed or unparseable generations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalAnalysis {
    pub summary: String,
    pub historical_events: Vec<HistoricalEvent>,
}

impl HistoricalAnalysis {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.historical_events.is_empty()
    }
}

/// The canonical news record used throughout the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Stable id derived from (title, source name); see `normalizer::generate_id`.
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub region: String,
    pub priority: Priority,
    /// Human-relative time label computed at fetch time ("12m ago", "unknown").
    pub time: String,
    /// Empty until enrichment runs; at most 5 entries once it has.
    #[serde(default)]
    pub related_history: Vec<HistoricalEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_summary: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    /// Only the first N entries of each feed are considered.
    pub max_items_per_feed: usize,
    /// Freshness window for the aggregated cache snapshot.
    pub cache_ttl_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-historian/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_items_per_feed: 10,
            cache_ttl_seconds: 5 * 60,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Generation service error: {0}")]
    Model(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
