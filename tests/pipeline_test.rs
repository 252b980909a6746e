use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use news_historian::aggregator::NewsAggregator;
use news_historian::enrichment::EnrichmentEngine;
use news_historian::fetcher::FetchSource;
use news_historian::normalizer;
use news_historian::ollama::TextGenerator;
use news_historian::pipeline::{build_news, enrich_in_batches, merge_previous_enrichment, BuildOutput};
use news_historian::types::{
    FeedSource, FetchConfig, HistoricalEvent, NewsItem, Priority, Result,
};

/// Generator whose behavior is keyed on the prompt: items whose title
/// contains "Doomed" get an unparseable reply.
struct KeyedGenerator {
    calls: AtomicUsize,
    reachable: bool,
}

#[async_trait]
impl TextGenerator for KeyedGenerator {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("Doomed") {
            Ok("no structured data in this reply".to_string())
        } else {
            Ok(r#"{
                "summary": "Historical context.",
                "historicalEvents": [
                    {"year": "1990", "title": "Precedent", "description": "d", "significance": "s"}
                ]
            }"#
            .to_string())
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        if self.reachable {
            Ok(vec!["llama3.2".to_string()])
        } else {
            Err(news_historian::types::AggregatorError::Model(
                "connection refused".to_string(),
            ))
        }
    }
}

fn item(title: &str, link: Option<&str>) -> NewsItem {
    NewsItem {
        id: normalizer::generate_id(title, "Feed"),
        title: title.to_string(),
        summary: String::new(),
        content: "body".to_string(),
        region: "Asia".to_string(),
        priority: Priority::Normal,
        time: "unknown".to_string(),
        related_history: Vec::new(),
        historical_summary: None,
        tags: Vec::new(),
        link: link.map(|l| l.to_string()),
        source: "Feed".to_string(),
    }
}

fn enriched_item(title: &str, link: &str) -> NewsItem {
    let mut it = item(title, Some(link));
    it.related_history = vec![HistoricalEvent {
        year: "1990".to_string(),
        title: "Precedent".to_string(),
        description: "d".to_string(),
        significance: "s".to_string(),
    }];
    it.historical_summary = Some("carried forward".to_string());
    it
}

#[test]
fn test_merge_reuses_by_link_when_complete() {
    let mut news = vec![
        item("story one", Some("https://example.com/1")),
        item("story two", Some("https://example.com/2")),
        item("story three", None),
    ];

    // Previous run: item 1 fully enriched, item 2 has events but no
    // summary and must not be reused.
    let mut incomplete = item("story two", Some("https://example.com/2"));
    incomplete.related_history = vec![HistoricalEvent {
        year: "1990".to_string(),
        title: "Precedent".to_string(),
        description: "d".to_string(),
        significance: "s".to_string(),
    }];
    let previous = vec![
        enriched_item("story one", "https://example.com/1"),
        incomplete,
    ];

    let reused = merge_previous_enrichment(&mut news, &previous);
    assert_eq!(reused, 1);
    assert_eq!(
        news[0].historical_summary.as_deref(),
        Some("carried forward")
    );
    assert!(news[1].related_history.is_empty());
    assert!(news[2].related_history.is_empty());
}

#[test]
fn test_merge_ignores_unrelated_links() {
    let mut news = vec![item("story", Some("https://example.com/new"))];
    let previous = vec![enriched_item("story", "https://example.com/old")];
    assert_eq!(merge_previous_enrichment(&mut news, &previous), 0);
}

#[tokio::test]
async fn test_enrich_in_batches_tracks_outcomes_independently() {
    let generator = Arc::new(KeyedGenerator {
        calls: AtomicUsize::new(0),
        reachable: true,
    });
    let enricher = EnrichmentEngine::new(generator.clone());

    let mut news = vec![
        item("story one", None),
        item("Doomed story", None),
        item("story two", None),
        item("story three", None),
        item("story four", None),
        enriched_item("already done", "https://example.com/done"),
    ];

    enrich_in_batches(&enricher, &mut news).await;

    // Five pending items were sent; the already-enriched one was not.
    assert_eq!(generator.calls.load(Ordering::SeqCst), 5);

    // The doomed item stays unenriched without blocking its batch-mates.
    assert!(news[1].related_history.is_empty());
    for idx in [0, 2, 3, 4] {
        assert_eq!(news[idx].related_history.len(), 1, "item {} not enriched", idx);
        assert_eq!(
            news[idx].historical_summary.as_deref(),
            Some("Historical context.")
        );
    }
}

struct MockFetcher {
    items: Vec<NewsItem>,
}

#[async_trait]
impl FetchSource for MockFetcher {
    async fn fetch(&self, _source: &FeedSource) -> Vec<NewsItem> {
        self.items.clone()
    }
}

fn test_aggregator(items: Vec<NewsItem>) -> NewsAggregator {
    let sources = vec![FeedSource {
        name: "Feed".to_string(),
        url: "https://example.com/feed".to_string(),
        region: "Asia".to_string(),
    }];
    NewsAggregator::new(
        sources,
        Arc::new(MockFetcher { items }),
        &FetchConfig::default(),
    )
}

#[tokio::test]
async fn test_build_news_writes_snapshot_and_reuses_it() {
    let output_path = std::env::temp_dir().join(format!(
        "news-historian-build-test-{}.json",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&output_path);

    let items = vec![item("story one", Some("https://example.com/1"))];

    // First run: enrichment enabled, everything generated fresh.
    let generator = Arc::new(KeyedGenerator {
        calls: AtomicUsize::new(0),
        reachable: true,
    });
    let enricher = EnrichmentEngine::new(generator.clone());
    let aggregator = test_aggregator(items.clone());

    let output = build_news(&aggregator, &enricher, &output_path)
        .await
        .unwrap();
    assert!(output.ollama_enabled);
    assert_eq!(output.total_news, 1);
    assert_eq!(output.news[0].related_history.len(), 1);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    let written: BuildOutput =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(written.total_news, 1);

    // Second run with the generation service down: enrichment is
    // disabled, but the previous snapshot still supplies history by
    // link.
    let down_enricher = EnrichmentEngine::new(Arc::new(KeyedGenerator {
        calls: AtomicUsize::new(0),
        reachable: false,
    }));
    let aggregator = test_aggregator(items);

    let output = build_news(&aggregator, &down_enricher, &output_path)
        .await
        .unwrap();
    assert!(!output.ollama_enabled);
    assert_eq!(output.news[0].related_history.len(), 1);
    assert_eq!(
        output.news[0].historical_summary.as_deref(),
        Some("Historical context.")
    );

    let _ = std::fs::remove_file(&output_path);
}
