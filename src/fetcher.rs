use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::Utc;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::normalizer;
use crate::types::{AggregatorError, FeedSource, FetchConfig, NewsItem, RawEntry, Result};

/// A source of normalized news items. The HTTP implementation lives in
/// `FeedFetcher`; tests substitute mocks.
#[async_trait]
pub trait FetchSource: Send + Sync {
    /// Fetch and normalize one feed. Failures are absorbed here: any
    /// retrieval or parse error yields an empty sequence for that
    /// source and never aborts the overall aggregation.
    async fn fetch(&self, source: &FeedSource) -> Vec<NewsItem>;
}

pub struct FeedFetcher {
    client: Client,
    config: FetchConfig,
}

impl FeedFetcher {
    pub fn new(config: FetchConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    async fn fetch_document(&self, url: &str) -> Result<String> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 30)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.try_fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AggregatorError::General(format!("Failed to fetch {}", url))))
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AggregatorError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        Ok(response.text().await?)
    }

    fn parse_entries(&self, content: &str) -> Result<Vec<RawEntry>> {
        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        Ok(feed
            .entries
            .into_iter()
            .take(self.config.max_items_per_feed)
            .map(to_raw_entry)
            .collect())
    }
}

#[async_trait]
impl FetchSource for FeedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Vec<NewsItem> {
        debug!("Fetching feed: {} ({})", source.name, source.url);

        let entries = match self.fetch_document(&source.url).await {
            Ok(content) => match self.parse_entries(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    error!("Error parsing feed {}: {}", source.name, e);
                    return Vec::new();
                }
            },
            Err(e) => {
                error!("Error fetching feed {}: {}", source.name, e);
                return Vec::new();
            }
        };

        let now = Utc::now();
        let items: Vec<NewsItem> = entries
            .iter()
            .map(|entry| normalizer::normalize(entry, source, now))
            .collect();

        info!("Feed {}: normalized {} items", source.name, items.len());
        items
    }
}

fn to_raw_entry(entry: feed_rs::model::Entry) -> RawEntry {
    RawEntry {
        title: entry.title.map(|t| t.content),
        snippet: entry.summary.map(|s| s.content),
        content: entry.content.and_then(|c| c.body),
        link: entry.links.first().map(|l| l.href.clone()),
        published: entry.published.map(|dt| dt.with_timezone(&Utc)),
        categories: entry.categories.into_iter().map(|c| c.term).collect(),
    }
}
