//! Hosted managed store adapter (Pinecone data-plane REST API).
//!
//! Talks directly to the index host with the `Api-Key` header. `dump` uses
//! a zero-vector query with `includeValues`, which returns every vector for
//! the index sizes this tool targets.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::PineconeConfig;
use crate::error::{Error, Result};
use crate::models::{SearchHit, VectorRecord};

use super::{text_from_metadata, VectorStore};

/// Upper bound on vectors fetched by [`VectorStore::dump`].
const DUMP_LIMIT: usize = 10_000;

pub struct PineconeStore {
    index_host: String,
    namespace: Option<String>,
    api_key: String,
    client: reqwest::Client,
}

impl PineconeStore {
    /// Create a new adapter from configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `PINECONE_API_KEY` is not set.
    pub fn new(config: &PineconeConfig) -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| Error::config("PINECONE_API_KEY environment variable not set"))?;

        Ok(Self {
            index_host: config.index_host.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}{}", self.index_host, path);
        let resp = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::service("pinecone", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(Error::service(
                "pinecone",
                format!("API error {}: {}", status, body_text),
            ));
        }

        resp.json().await.map_err(|e| Error::service("pinecone", e))
    }

    async fn index_stats(&self) -> Result<Value> {
        self.post("/describe_index_stats", json!({})).await
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn init(&self, dims: usize) -> Result<()> {
        // The index itself is provisioned out of band; verify reachability
        // and that its dimensionality matches the embedding config.
        let stats = self.index_stats().await?;
        let index_dims = stats.get("dimension").and_then(|d| d.as_u64());
        if let Some(d) = index_dims {
            if d as usize != dims {
                return Err(Error::config(format!(
                    "pinecone index dimension {} does not match embedding.dims {}",
                    d, dims
                )));
            }
        }
        debug!(dims, "pinecone index reachable");
        Ok(())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut body = json!({ "vectors": records });
        if let Some(ref ns) = self.namespace {
            body["namespace"] = json!(ns);
        }
        self.post("/vectors/upsert", body).await?;
        debug!(count = records.len(), "upserted vectors to pinecone");
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(ref ns) = self.namespace {
            body["namespace"] = json!(ns);
        }

        let json = self.post("/query", body).await?;
        Ok(parse_matches(&json, false)
            .into_iter()
            .map(|(record, score)| SearchHit {
                text: text_from_metadata(&record.metadata),
                id: record.id,
                score,
                metadata: record.metadata,
            })
            .collect())
    }

    async fn dump(&self) -> Result<Vec<VectorRecord>> {
        let stats = self.index_stats().await?;
        let total = stats
            .get("totalVectorCount")
            .and_then(|t| t.as_u64())
            .unwrap_or(0) as usize;
        if total == 0 {
            return Ok(Vec::new());
        }

        let dims = stats
            .get("dimension")
            .and_then(|d| d.as_u64())
            .ok_or_else(|| Error::service("pinecone", "index stats missing dimension"))?
            as usize;

        // A zero vector matches everything equally; with topK at the total
        // count this pages the whole index back in one response.
        let mut body = json!({
            "vector": vec![0.0f32; dims],
            "topK": total.min(DUMP_LIMIT),
            "includeMetadata": true,
            "includeValues": true,
        });
        if let Some(ref ns) = self.namespace {
            body["namespace"] = json!(ns);
        }

        let json = self.post("/query", body).await?;
        let records = parse_matches(&json, true)
            .into_iter()
            .map(|(record, _)| record)
            .collect();
        Ok(records)
    }
}

/// Parse `matches` from a query response into records with scores.
fn parse_matches(json: &Value, with_values: bool) -> Vec<(VectorRecord, f32)> {
    json.get("matches")
        .and_then(|m| m.as_array())
        .map(|matches| {
            matches
                .iter()
                .filter_map(|m| {
                    let id = m.get("id")?.as_str()?.to_string();
                    let score = m.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32;
                    let metadata = m
                        .get("metadata")
                        .and_then(|v| v.as_object())
                        .cloned()
                        .unwrap_or_default();
                    let values = if with_values {
                        m.get("values")
                            .and_then(|v| v.as_array())
                            .map(|arr| {
                                arr.iter()
                                    .map(|x| x.as_f64().unwrap_or(0.0) as f32)
                                    .collect()
                            })
                            .unwrap_or_default()
                    } else {
                        Vec::new()
                    };
                    Some((
                        VectorRecord {
                            id,
                            values,
                            metadata,
                        },
                        score,
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}
