//! Core data models used throughout askbase.
//!
//! These types represent the documents, chunks, and vector records that flow
//! through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A source document prior to chunking.
///
/// Immutable once created; re-ingesting the same source replaces its
/// vectors in the store (document ids are derived from the source path).
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub source: String,
    pub body: String,
    /// Free-form metadata carried onto every chunk's vector record.
    pub metadata: Map<String, Value>,
}

/// A window of a document's body text.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub struct Chunk {
    /// `{document_id}_chunk_{index}` — also the vector id in the store.
    pub id: String,
    pub document_id: String,
    /// Zero-based, contiguous within the document.
    pub index: usize,
    /// Total chunks produced for the document.
    pub total: usize,
    /// Character offset of the window start in the parent body.
    pub start: usize,
    /// Character offset one past the window end.
    pub end: usize,
    pub text: String,
}

/// The vector-store write path: one embedded chunk with its metadata.
///
/// The field names mirror the wire shape used by the hosted store, which
/// also makes exports directly re-importable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// The vector-store read path: a matched chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    /// The stored chunk text (from the record metadata).
    pub text: String,
    pub metadata: Map<String, Value>,
}
