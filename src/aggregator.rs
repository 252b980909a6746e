use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::config::ALL_REGIONS;
use crate::fetcher::FetchSource;
use crate::types::{FeedSource, FetchConfig, HistoricalAnalysis, NewsItem};

struct CacheSnapshot {
    items: Vec<NewsItem>,
    fetched_at: Instant,
}

/// Fans out fetches to all configured feeds, merges and deduplicates
/// the results, and serves them from a time-bounded snapshot cache.
pub struct NewsAggregator {
    sources: Vec<FeedSource>,
    fetcher: Arc<dyn FetchSource>,
    cache: RwLock<Option<CacheSnapshot>>,
    // Single-flight guard: only one refresh fans out at a time;
    // callers that queued behind it reuse the snapshot it produced.
    refresh_guard: Mutex<()>,
    cache_ttl: Duration,
}

impl NewsAggregator {
    pub fn new(sources: Vec<FeedSource>, fetcher: Arc<dyn FetchSource>, config: &FetchConfig) -> Self {
        Self {
            sources,
            fetcher,
            cache: RwLock::new(None),
            refresh_guard: Mutex::new(()),
            cache_ttl: Duration::from_secs(config.cache_ttl_seconds),
        }
    }

    /// Return the aggregated item list, serving the cached snapshot when
    /// it is younger than the freshness window and no refresh is forced.
    pub async fn fetch_all(&self, force_refresh: bool) -> Vec<NewsItem> {
        if !force_refresh {
            if let Some(items) = self.fresh_snapshot().await {
                return items;
            }
        }

        let _refresh = self.refresh_guard.lock().await;

        // A refresh that completed while we waited on the guard
        // satisfies non-forced callers without another fan-out.
        if !force_refresh {
            if let Some(items) = self.fresh_snapshot().await {
                return items;
            }
        }

        info!("Fetching {} feeds", self.sources.len());

        let fetches = self.sources.iter().map(|source| self.fetcher.fetch(source));
        let results = future::join_all(fetches).await;
        let merged: Vec<NewsItem> = results.into_iter().flatten().collect();

        let mut items = dedup_by_title(merged);
        // Stable sort on priority alone; equal priorities keep fetch order.
        items.sort_by_key(|item| item.priority);

        info!("Fetched {} news items", items.len());

        let mut cache = self.cache.write().await;
        *cache = Some(CacheSnapshot {
            items: items.clone(),
            fetched_at: Instant::now(),
        });

        items
    }

    async fn fresh_snapshot(&self) -> Option<Vec<NewsItem>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|snapshot| {
                !snapshot.items.is_empty() && snapshot.fetched_at.elapsed() < self.cache_ttl
            })
            .map(|snapshot| snapshot.items.clone())
    }

    /// Look up one item in the current snapshot. Never triggers a fetch.
    pub async fn get_by_id(&self, id: &str) -> Option<NewsItem> {
        let cache = self.cache.read().await;
        cache
            .as_ref()?
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// Filter the current snapshot by region and free-text query.
    pub async fn filter(&self, region: Option<&str>, query: Option<&str>) -> Vec<NewsItem> {
        let cache = self.cache.read().await;
        let items = cache
            .as_ref()
            .map(|snapshot| snapshot.items.as_slice())
            .unwrap_or_default();
        filter_items(items, region, query)
    }

    /// Attach enrichment results to the snapshot item with the given id.
    /// This is the only in-place mutation a snapshot ever sees.
    pub async fn attach_history(&self, id: &str, analysis: &HistoricalAnalysis) {
        let mut cache = self.cache.write().await;
        if let Some(snapshot) = cache.as_mut() {
            if let Some(item) = snapshot.items.iter_mut().find(|item| item.id == id) {
                item.related_history = analysis.historical_events.clone();
                item.historical_summary = Some(analysis.summary.clone());
            }
        }
    }
}

/// Drop items whose lower-cased, trimmed title was already seen; the
/// first occurrence in fetch order wins.
pub fn dedup_by_title(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.title.trim().to_lowercase()))
        .collect()
}

/// Region passes when unset or the "all" sentinel, otherwise exact
/// match. Query passes when absent or empty, otherwise case-insensitive
/// substring match against title, summary, or any tag.
pub fn filter_items(items: &[NewsItem], region: Option<&str>, query: Option<&str>) -> Vec<NewsItem> {
    let query = query.map(|q| q.to_lowercase());

    items
        .iter()
        .filter(|item| {
            let matches_region = match region {
                None => true,
                Some(r) if r.is_empty() || r == ALL_REGIONS => true,
                Some(r) => item.region == r,
            };

            let matches_query = match &query {
                None => true,
                Some(q) if q.is_empty() => true,
                Some(q) => {
                    item.title.to_lowercase().contains(q)
                        || item.summary.to_lowercase().contains(q)
                        || item.tags.iter().any(|tag| tag.to_lowercase().contains(q))
                }
            };

            matches_region && matches_query
        })
        .cloned()
        .collect()
}
