//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and concrete implementations:
//! - **[`DisabledEmbeddings`]** — returns errors; used when embeddings are not configured.
//! - **[`OpenAiEmbeddings`]** — calls an OpenAI-compatible embeddings API with
//!   batching, retry, and backoff. Pointing `base_url` at a locally served
//!   model (TEI, Ollama) works the same way.
//!
//! The same provider instance embeds chunks at ingestion time and queries at
//! question time; embedding-space compatibility is a configuration concern,
//! not a runtime check.
//!
//! # Retry Strategy
//!
//! The OpenAI provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// Trait for embedding providers.
///
/// Implementations must embed a batch of texts into fixed-length vectors,
/// one per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single query text.
///
/// Convenience wrapper around [`EmbeddingProvider::embed_batch`] for
/// single-text use cases (e.g. embedding a question for similarity search).
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let results = provider.embed_batch(&[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| Error::service("embedding", "empty embedding response"))
}

// ============ Disabled Provider ============

/// A no-op embedding provider that always returns errors.
///
/// Used when `embedding.provider = "disabled"` in the configuration.
pub struct DisabledEmbeddings;

#[async_trait]
impl EmbeddingProvider for DisabledEmbeddings {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::config(
            "Embedding provider is disabled. Set [embedding] provider in config.",
        ))
    }
}

// ============ OpenAI-compatible Provider ============

/// Embedding provider speaking the OpenAI embeddings wire format.
///
/// Calls `POST {base_url}/embeddings` with the configured model. Requires
/// the `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAiEmbeddings {
    base_url: String,
    model: String,
    dims: usize,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiEmbeddings {
    /// Create a new provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `model` or `dims` is not set, or if
    /// `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::config("embedding.model required for openai provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| Error::config("embedding.dims required for openai provider"))?;

        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::config("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::service("embedding", e))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model,
            dims,
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| Error::service("embedding", e))?;
                        return parse_embeddings_response(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        debug!(attempt, %status, "embedding request retrying");
                        last_err = Some(Error::service(
                            "embedding",
                            format!("API error {}: {}", status, body_text),
                        ));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(Error::service(
                        "embedding",
                        format!("API error {}: {}", status, body_text),
                    ));
                }
                Err(e) => {
                    last_err = Some(Error::service("embedding", e));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::service("embedding", "embedding failed after retries")))
    }
}

/// Parse an OpenAI-format embeddings response.
///
/// Extracts the `data[].embedding` arrays and returns them in order.
fn parse_embeddings_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| Error::service("embedding", "invalid response: missing data array"))?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| Error::service("embedding", "invalid response: missing embedding"))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        embeddings.push(vec);
    }

    Ok(embeddings)
}

/// Create the appropriate [`EmbeddingProvider`] based on configuration.
///
/// # Errors
///
/// Returns an error for unknown provider names or if the OpenAI provider
/// cannot be initialized (missing config or API key).
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledEmbeddings)),
        "openai" => Ok(Box::new(OpenAiEmbeddings::new(config)?)),
        other => Err(Error::config(format!(
            "Unknown embedding provider: {}",
            other
        ))),
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty vectors or vectors of
/// different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
