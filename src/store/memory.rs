//! In-memory [`VectorStore`] for tests and dry runs.
//!
//! Brute-force cosine similarity over everything stored, behind a
//! `std::sync::RwLock`. State lives only for the process lifetime.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::Result;
use crate::models::{SearchHit, VectorRecord};

use super::{text_from_metadata, VectorStore};

pub struct MemoryStore {
    records: RwLock<Vec<VectorRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn init(&self, _dims: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let mut stored = self.records.write().unwrap();
        for record in records {
            stored.retain(|r| r.id != record.id);
            stored.push(record.clone());
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let stored = self.records.read().unwrap();
        let mut hits: Vec<SearchHit> = stored
            .iter()
            .map(|r| SearchHit {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.values),
                text: text_from_metadata(&r.metadata),
                metadata: r.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn dump(&self) -> Result<Vec<VectorRecord>> {
        Ok(self.records.read().unwrap().clone())
    }
}
