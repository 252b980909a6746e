pub mod aggregator;
pub mod config;
pub mod enrichment;
pub mod fetcher;
pub mod normalizer;
pub mod ollama;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod types;

pub use aggregator::NewsAggregator;
pub use enrichment::EnrichmentEngine;
pub use fetcher::{FeedFetcher, FetchSource};
pub use ollama::{OllamaClient, TextGenerator};
pub use server::AppState;
pub use types::*;
