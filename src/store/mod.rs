//! Vector store abstraction for askbase.
//!
//! The [`VectorStore`] trait defines the narrow contract the pipeline needs
//! from a similarity-search backend: `upsert` on the write path and
//! `search` on the read path. The responder and ingestion depend only on
//! those two; `init` exists for setup and `dump` only for the
//! export/migrate tooling.
//!
//! Two remote adapters speak their service's REST API, and both present the
//! identical request/response shapes, so swapping backends is a config
//! change:
//!
//! | Provider | Backend |
//! |----------|---------|
//! | `pinecone` | Hosted managed index ([`pinecone::PineconeStore`]) |
//! | `qdrant` | Self-hosted collection ([`qdrant::QdrantStore`]) |
//! | `memory` | In-process, for tests and dry runs ([`memory::MemoryStore`]) |

pub mod memory;
pub mod pinecone;
pub mod qdrant;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{SearchHit, VectorRecord};

/// Abstract similarity-search backend.
///
/// Implementations must be `Send + Sync`; each CLI invocation builds one
/// store and drops it at exit.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns the provider name (e.g. `"pinecone"`).
    fn name(&self) -> &str;

    /// Create or verify the backing collection/index. Idempotent.
    async fn init(&self, dims: usize) -> Result<()>;

    /// Write a batch of records. Existing ids are overwritten.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Return the `top_k` records most similar to `vector`, ordered by
    /// descending similarity score.
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    /// Return every stored record. Used by `export` and `migrate` only.
    async fn dump(&self) -> Result<Vec<VectorRecord>>;
}

/// Create the configured [`VectorStore`].
pub fn create_store(config: &Config) -> Result<Box<dyn VectorStore>> {
    create_store_named(config, &config.store.provider)
}

/// Create a [`VectorStore`] for an explicitly named provider.
///
/// Used by `migrate`, where the target differs from the configured store
/// but draws its settings from the same config file.
pub fn create_store_named(config: &Config, provider: &str) -> Result<Box<dyn VectorStore>> {
    match provider {
        "pinecone" => {
            let cfg = config.store.pinecone.as_ref().ok_or_else(|| {
                Error::config("[store.pinecone] section required for the pinecone store")
            })?;
            Ok(Box::new(pinecone::PineconeStore::new(cfg)?))
        }
        "qdrant" => {
            let cfg = config.store.qdrant.as_ref().ok_or_else(|| {
                Error::config("[store.qdrant] section required for the qdrant store")
            })?;
            Ok(Box::new(qdrant::QdrantStore::new(cfg)?))
        }
        "memory" => Ok(Box::new(memory::MemoryStore::new())),
        other => Err(Error::config(format!(
            "Unknown store provider: '{}'. Must be pinecone, qdrant, or memory.",
            other
        ))),
    }
}

/// Pull the stored chunk text out of record metadata.
pub(crate) fn text_from_metadata(metadata: &serde_json::Map<String, serde_json::Value>) -> String {
    metadata
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
