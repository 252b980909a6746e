use std::env;

use crate::types::{FeedSource, Priority};

/// Sentinel region value that matches every item.
pub const ALL_REGIONS: &str = "all";

/// Recognized region labels, sentinel first.
pub const REGIONS: [&str; 7] = [
    ALL_REGIONS,
    "Asia",
    "Europe",
    "Middle East",
    "Americas",
    "Africa",
    "Oceania",
];

/// Ordered priority rules, evaluated top-down; the first rule whose
/// keyword set matches wins. Kept as data so classification can be
/// tested independently of fetch/parse code.
pub const PRIORITY_RULES: &[(Priority, &[&str])] = &[
    (
        Priority::Urgent,
        &[
            "breaking", "urgent", "emergency", "速報", "緊急", "disaster", "attack", "war",
            "explosion", "quake", "tsunami",
        ],
    ),
    (
        Priority::Important,
        &[
            "important", "major", "significant", "重要", "election", "summit", "death", "killed",
        ],
    ),
];

/// Topic labels and the title keywords that trigger them.
pub const TOPIC_RULES: &[(&str, &[&str])] = &[
    (
        "politics",
        &["politics", "election", "government", "minister", "president", "parliament"],
    ),
    (
        "economy",
        &["economy", "market", "trade", "business", "stock", "inflation"],
    ),
    (
        "environment",
        &["climate", "environment", "pollution", "green", "sustainable"],
    ),
    ("technology", &["tech", "ai", "digital", "cyber", "innovation"]),
    ("sports", &["sport", "football", "olympic", "championship", "match"]),
    ("culture", &["culture", "art", "music", "film", "festival"]),
    ("health", &["health", "medical", "hospital", "disease", "vaccine"]),
    ("science", &["science", "research", "discovery", "space", "nasa"]),
];

/// The static feed table, loaded once at startup and immutable for the
/// process lifetime.
pub fn feed_sources() -> Vec<FeedSource> {
    [
        ("NHK World News", "https://www3.nhk.or.jp/rss/news/cat0.xml", "Asia"),
        ("BBC News World", "https://feeds.bbci.co.uk/news/world/rss.xml", "Europe"),
        ("BBC News Asia", "https://feeds.bbci.co.uk/news/world/asia/rss.xml", "Asia"),
        (
            "BBC News Middle East",
            "https://feeds.bbci.co.uk/news/world/middle_east/rss.xml",
            "Middle East",
        ),
        (
            "BBC News Africa",
            "https://feeds.bbci.co.uk/news/world/africa/rss.xml",
            "Africa",
        ),
        (
            "BBC News US & Canada",
            "https://feeds.bbci.co.uk/news/world/us_and_canada/rss.xml",
            "Americas",
        ),
        (
            "BBC News Europe",
            "https://feeds.bbci.co.uk/news/world/europe/rss.xml",
            "Europe",
        ),
    ]
    .iter()
    .map(|(name, url, region)| FeedSource {
        name: name.to_string(),
        url: url.to_string(),
        region: region.to_string(),
    })
    .collect()
}

/// Runtime settings read from the environment, with defaults for local use.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ollama_host: String,
    pub ollama_model: String,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            ollama_host: env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
        }
    }
}
