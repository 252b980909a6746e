use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AggregatorError, Result};

/// A synchronous text-generation capability plus a reachability probe.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one system instruction and one user message, returning the
    /// raw generated text.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;

    /// List the models the service has available; used to establish
    /// reachability before attempting enrichment.
    async fn list_models(&self) -> Result<Vec<String>>;
}

/// Client for an Ollama-compatible endpoint.
pub struct OllamaClient {
    host: String,
    model: String,
    http: Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    // Generation is slow; give it a much longer budget than feed fetches.
    const GENERATE_TIMEOUT_SECONDS: u64 = 120;

    pub fn new(host: &str, model: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(Self::GENERATE_TIMEOUT_SECONDS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            http,
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.host);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            stream: false,
            options: ChatOptions { temperature: 0.7 },
        };

        debug!("Ollama chat request to {} (model {})", url, self.model);

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AggregatorError::Model(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = response.json().await?;
        Ok(chat.message.content)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.host);
        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AggregatorError::Model(format!("HTTP {}", status)));
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
