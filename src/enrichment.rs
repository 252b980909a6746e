use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::ollama::TextGenerator;
use crate::prompts;
use crate::types::{HistoricalAnalysis, HistoricalEvent, NewsItem};

const MAX_EVENTS: usize = 5;

/// Best-effort, cached enrichment of single items with model-generated
/// historical background. Failures never surface to the caller; they
/// yield the empty analysis and leave the cache untouched so a later
/// call may retry.
pub struct EnrichmentEngine {
    generator: Arc<dyn TextGenerator>,
    cache: RwLock<HashMap<String, HistoricalAnalysis>>,
}

impl EnrichmentEngine {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Produce the historical analysis for one item, serving a cached
    /// result when the item id has one.
    pub async fn enrich(&self, item: &NewsItem) -> HistoricalAnalysis {
        {
            let cache = self.cache.read().await;
            if let Some(hit) = cache.get(&item.id) {
                debug!("Enrichment cache hit for {}", item.id);
                return hit.clone();
            }
        }

        let prompt = prompts::historical_analysis_prompt(item);
        let response = match self
            .generator
            .generate(prompts::HISTORICAL_ANALYST_SYSTEM, &prompt)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!("Generation call failed for {}: {}", item.id, e);
                return HistoricalAnalysis::default();
            }
        };

        let analysis = match parse_historical_analysis(&response) {
            Some(analysis) => analysis,
            None => {
                error!("No parseable analysis in response for {}", item.id);
                HistoricalAnalysis::default()
            }
        };

        // Only cache results with substance; wholly empty results stay
        // uncached so the next request retries.
        if !analysis.is_empty() {
            let mut cache = self.cache.write().await;
            cache.insert(item.id.clone(), analysis.clone());
        }

        analysis
    }

    /// Reachability probe against the generation service. A failure
    /// disables enrichment for the session but is never fatal.
    pub async fn check_connection(&self) -> bool {
        match self.generator.list_models().await {
            Ok(models) => {
                info!("Generation service connected. Available models: {:?}", models);
                true
            }
            Err(e) => {
                error!("Failed to connect to generation service: {}", e);
                false
            }
        }
    }

    /// Operator action: drop all cached analyses.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        info!("History cache cleared");
    }
}

/// Extract the first greedy `{...}` region of a free-form reply: from
/// the first opening brace to the last closing one.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse a raw model reply into a validated analysis. Returns `None`
/// when no JSON object can be located or parsed; event candidates
/// missing any required field are dropped, scalar fields are coerced to
/// text, and the event list is capped.
pub fn parse_historical_analysis(response: &str) -> Option<HistoricalAnalysis> {
    let raw = extract_json_object(response)?;
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    let summary = object
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let mut historical_events = Vec::new();
    if let Some(candidates) = object.get("historicalEvents").and_then(|v| v.as_array()) {
        for candidate in candidates {
            if let Some(event) = coerce_event(candidate) {
                historical_events.push(event);
            }
            if historical_events.len() == MAX_EVENTS {
                break;
            }
        }
    }

    Some(HistoricalAnalysis {
        summary,
        historical_events,
    })
}

fn coerce_event(value: &Value) -> Option<HistoricalEvent> {
    let object = value.as_object()?;
    Some(HistoricalEvent {
        year: coerce_text(object.get("year")?),
        title: coerce_text(object.get("title")?),
        description: coerce_text(object.get("description")?),
        significance: coerce_text(object.get("significance")?),
    })
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
