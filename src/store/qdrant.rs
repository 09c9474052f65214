//! Self-hosted store adapter (Qdrant REST API).
//!
//! Collections are created on demand with cosine distance. Qdrant point ids
//! must be UUIDs or integers, so each chunk id is digested into a
//! deterministic UUIDv5 and the original id rides in the payload as
//! `chunk_id`.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::config::QdrantConfig;
use crate::error::{Error, Result};
use crate::models::{SearchHit, VectorRecord};

use super::{text_from_metadata, VectorStore};

/// Page size for [`VectorStore::dump`] scrolling.
const SCROLL_PAGE: usize = 256;

pub struct QdrantStore {
    url: String,
    collection: String,
    client: reqwest::Client,
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            client: reqwest::Client::new(),
        })
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.url, self.collection, suffix)
    }

    async fn check(&self, resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(Error::service(
                "qdrant",
                format!("API error {}: {}", status, body_text),
            ));
        }
        resp.json().await.map_err(|e| Error::service("qdrant", e))
    }

    fn point_id(chunk_id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn init(&self, dims: usize) -> Result<()> {
        let existing = self
            .client
            .get(self.collection_url(""))
            .send()
            .await
            .map_err(|e| Error::service("qdrant", e))?;

        if existing.status().is_success() {
            debug!(collection = %self.collection, "qdrant collection already exists");
            return Ok(());
        }

        let resp = self
            .client
            .put(self.collection_url(""))
            .json(&json!({
                "vectors": { "size": dims, "distance": "Cosine" }
            }))
            .send()
            .await
            .map_err(|e| Error::service("qdrant", e))?;
        self.check(resp).await?;
        debug!(collection = %self.collection, dims, "created qdrant collection");
        Ok(())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<Value> = records
            .iter()
            .map(|record| {
                let mut payload = record.metadata.clone();
                payload.insert("chunk_id".to_string(), json!(record.id));
                json!({
                    "id": Self::point_id(&record.id),
                    "vector": record.values,
                    "payload": payload,
                })
            })
            .collect();

        let resp = self
            .client
            .put(self.collection_url("/points?wait=true"))
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| Error::service("qdrant", e))?;
        self.check(resp).await?;
        debug!(count = records.len(), "upserted points to qdrant");
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let resp = self
            .client
            .post(self.collection_url("/points/search"))
            .json(&json!({
                "vector": vector,
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await
            .map_err(|e| Error::service("qdrant", e))?;
        let json = self.check(resp).await?;

        let hits = json
            .get("result")
            .and_then(|r| r.as_array())
            .map(|points| {
                points
                    .iter()
                    .map(|point| {
                        let score =
                            point.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32;
                        let (id, metadata) = split_payload(point);
                        SearchHit {
                            text: text_from_metadata(&metadata),
                            id,
                            score,
                            metadata,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }

    async fn dump(&self) -> Result<Vec<VectorRecord>> {
        let mut records = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "limit": SCROLL_PAGE,
                "with_payload": true,
                "with_vector": true,
            });
            if let Some(ref off) = offset {
                body["offset"] = off.clone();
            }

            let resp = self
                .client
                .post(self.collection_url("/points/scroll"))
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::service("qdrant", e))?;
            let json = self.check(resp).await?;

            let result = json
                .get("result")
                .ok_or_else(|| Error::service("qdrant", "scroll response missing result"))?;

            if let Some(points) = result.get("points").and_then(|p| p.as_array()) {
                for point in points {
                    let values = point
                        .get("vector")
                        .and_then(|v| v.as_array())
                        .map(|arr| {
                            arr.iter()
                                .map(|x| x.as_f64().unwrap_or(0.0) as f32)
                                .collect()
                        })
                        .unwrap_or_default();
                    let (id, metadata) = split_payload(point);
                    records.push(VectorRecord {
                        id,
                        values,
                        metadata,
                    });
                }
            }

            match result.get("next_page_offset") {
                Some(next) if !next.is_null() => offset = Some(next.clone()),
                _ => break,
            }
        }

        Ok(records)
    }
}

/// Extract the original chunk id and the remaining metadata from a point.
///
/// Falls back to the raw point id when no `chunk_id` payload entry exists
/// (points written by other tools).
fn split_payload(point: &Value) -> (String, Map<String, Value>) {
    let mut metadata = point
        .get("payload")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let id = match metadata.remove("chunk_id") {
        Some(Value::String(s)) => s,
        _ => point
            .get("id")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default(),
    };

    (id, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_deterministic() {
        let a = QdrantStore::point_id("doc1_chunk_0");
        let b = QdrantStore::point_id("doc1_chunk_0");
        let c = QdrantStore::point_id("doc1_chunk_1");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_split_payload_restores_chunk_id() {
        let point = json!({
            "id": "9b2f...",
            "score": 0.8,
            "payload": { "chunk_id": "doc1_chunk_2", "text": "hello", "title": "T" }
        });
        let (id, metadata) = split_payload(&point);
        assert_eq!(id, "doc1_chunk_2");
        assert_eq!(metadata["text"], "hello");
        assert!(!metadata.contains_key("chunk_id"));
    }

    #[test]
    fn test_split_payload_falls_back_to_point_id() {
        let point = json!({ "id": 42, "payload": { "text": "hi" } });
        let (id, _) = split_payload(&point);
        assert_eq!(id, "42");
    }
}
