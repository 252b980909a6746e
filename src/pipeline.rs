use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use futures::future;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregator::NewsAggregator;
use crate::enrichment::EnrichmentEngine;
use crate::types::{NewsItem, Result};

/// Enrichment calls run this many at a time to bound load on the
/// generation service.
const ENRICH_BATCH_SIZE: usize = 4;

/// Snapshot written by the offline build, consumed by static hosting.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub generated_at: String,
    pub ollama_enabled: bool,
    pub total_news: usize,
    pub news: Vec<NewsItem>,
}

/// Offline build: fetch everything, reuse enrichment from a previous
/// snapshot where possible, enrich the remainder in batches, and write
/// the combined snapshot to `output_path`.
pub async fn build_news(
    aggregator: &NewsAggregator,
    enricher: &EnrichmentEngine,
    output_path: &Path,
) -> Result<BuildOutput> {
    info!("Starting news build");

    let enrichment_enabled = enricher.check_connection().await;
    if !enrichment_enabled {
        warn!("Generation service unavailable; building without historical analysis");
    }

    let mut news = aggregator.fetch_all(true).await;
    info!("Fetched {} news items", news.len());

    let previous = load_previous(output_path);
    let reused = merge_previous_enrichment(&mut news, &previous);
    if reused > 0 {
        info!("Reused historical analysis for {} items from previous build", reused);
    }

    if enrichment_enabled {
        enrich_in_batches(enricher, &mut news).await;
    }

    let output = BuildOutput {
        generated_at: Utc::now().to_rfc3339(),
        ollama_enabled: enrichment_enabled,
        total_news: news.len(),
        news,
    };

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, serde_json::to_string_pretty(&output)?)?;

    info!(
        "Build complete: {} ({} items, enrichment {})",
        output_path.display(),
        output.total_news,
        if output.ollama_enabled { "enabled" } else { "disabled" }
    );

    Ok(output)
}

fn load_previous(path: &Path) -> Vec<NewsItem> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    match serde_json::from_str::<BuildOutput>(&raw) {
        Ok(previous) => previous.news,
        Err(e) => {
            warn!("Ignoring unreadable previous build at {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Carry enrichment forward from a previous snapshot: an item reuses
/// the earlier analysis when its link matches and the earlier item
/// carries both a non-empty summary and at least one event.
pub fn merge_previous_enrichment(news: &mut [NewsItem], previous: &[NewsItem]) -> usize {
    let mut by_link: HashMap<&str, &NewsItem> = HashMap::new();
    for item in previous {
        if let Some(link) = item.link.as_deref() {
            let has_summary = item
                .historical_summary
                .as_deref()
                .is_some_and(|s| !s.is_empty());
            if has_summary && !item.related_history.is_empty() {
                by_link.insert(link, item);
            }
        }
    }

    let mut reused = 0;
    for item in news.iter_mut() {
        if let Some(prev) = item.link.as_deref().and_then(|link| by_link.get(link)) {
            item.related_history = prev.related_history.clone();
            item.historical_summary = prev.historical_summary.clone();
            reused += 1;
        }
    }
    reused
}

/// Enrich every item that still lacks history, `ENRICH_BATCH_SIZE` at a
/// time. Outcomes are independent per item: an empty analysis is logged
/// and skipped without blocking its batch-mates.
pub async fn enrich_in_batches(enricher: &EnrichmentEngine, news: &mut [NewsItem]) {
    let pending: Vec<usize> = news
        .iter()
        .enumerate()
        .filter(|(_, item)| item.related_history.is_empty())
        .map(|(idx, _)| idx)
        .collect();

    info!("Generating historical analysis for {} items", pending.len());

    let mut enriched = 0;
    for chunk in pending.chunks(ENRICH_BATCH_SIZE) {
        let analyses =
            future::join_all(chunk.iter().map(|&idx| enricher.enrich(&news[idx]))).await;

        for (&idx, analysis) in chunk.iter().zip(analyses) {
            if analysis.is_empty() {
                warn!("No historical analysis produced for {}", news[idx].title);
                continue;
            }
            news[idx].related_history = analysis.historical_events;
            news[idx].historical_summary = Some(analysis.summary);
            enriched += 1;
        }
    }

    info!("Completed historical analysis for {} items", enriched);
}
