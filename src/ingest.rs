//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow: file discovery → documents → chunking →
//! embedding → batched upsert into the vector store. Document ids are
//! stable digests of the relative path, so re-running ingestion overwrites
//! vectors instead of duplicating them.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::Path;
use walkdir::WalkDir;

use crate::chunk::chunk_document;
use crate::config::{Config, IngestConfig};
use crate::embedding;
use crate::error::{Error, Result};
use crate::models::{Chunk, Document, VectorRecord};
use crate::store;

/// Records per upsert request.
const UPSERT_BATCH: usize = 100;

pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    let documents = discover_documents(&config.ingest)?;

    let mut chunked: Vec<(Document, Vec<Chunk>)> = Vec::new();
    let mut total_chunks = 0usize;
    for doc in documents {
        let chunks = chunk_document(&doc, config.chunking.chunk_size, config.chunking.overlap)?;
        if chunks.is_empty() {
            eprintln!("Warning: skipping empty document: {}", doc.source);
            continue;
        }
        total_chunks += chunks.len();
        chunked.push((doc, chunks));
    }

    if dry_run {
        println!("ingest {} (dry-run)", config.ingest.root.display());
        println!("  files: {}", chunked.len());
        println!("  estimated chunks: {}", total_chunks);
        return Ok(());
    }

    if !config.embedding.is_enabled() {
        return Err(Error::config(
            "ingest requires an embedding provider. Set [embedding] provider in config.",
        ));
    }

    let provider = embedding::create_provider(&config.embedding)?;
    let store = store::create_store(config)?;
    store.init(provider.dims()).await?;

    // Embed per document in config-sized batches, then build records.
    let mut records: Vec<VectorRecord> = Vec::with_capacity(total_chunks);
    let mut embedded = 0usize;
    for (doc, chunks) in &chunked {
        for batch in chunks.chunks(config.embedding.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = provider.embed_batch(&texts).await?;
            for (chunk, values) in batch.iter().zip(vectors) {
                records.push(build_record(doc, chunk, values));
            }
            embedded += batch.len();
            eprintln!("ingest  embedded {} / {} chunks", embedded, total_chunks);
        }
    }

    let mut upserted = 0usize;
    for batch in records.chunks(UPSERT_BATCH) {
        store.upsert(batch).await?;
        upserted += batch.len();
    }

    println!("ingest {}", config.ingest.root.display());
    println!("  files: {}", chunked.len());
    println!("  chunks: {}", total_chunks);
    println!("  embedding model: {}", provider.model_name());
    println!("  vectors upserted: {}", upserted);
    println!("ok");

    Ok(())
}

/// Scan the ingest root and build one document per matching file.
pub fn discover_documents(config: &IngestConfig) -> Result<Vec<Document>> {
    let root = &config.root;
    if !root.exists() {
        return Err(Error::config(format!(
            "ingest root does not exist: {}",
            root.display()
        )));
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut documents = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| Error::config(format!("scan failed: {}", e)))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match file_to_document(path, &rel_str) {
            Ok(doc) => documents.push(doc),
            Err(e) => eprintln!("Warning: skipping {}: {}", rel_str, e),
        }
    }

    // Sort for deterministic ordering
    documents.sort_by(|a, b| a.source.cmp(&b.source));

    Ok(documents)
}

fn file_to_document(path: &Path, relative_path: &str) -> Result<Document> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;

    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Document {
        id: document_id(relative_path),
        title,
        source: relative_path.to_string(),
        body,
        metadata: serde_json::Map::new(),
    })
}

/// Stable document id: truncated SHA-256 of the relative source path.
pub fn document_id(relative_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Build the store record for one embedded chunk.
///
/// Metadata carries the chunk text plus enough document context to display
/// search results without a second lookup.
fn build_record(doc: &Document, chunk: &Chunk, values: Vec<f32>) -> VectorRecord {
    let mut metadata = doc.metadata.clone();
    metadata.insert("text".to_string(), json!(chunk.text));
    metadata.insert("title".to_string(), json!(doc.title));
    metadata.insert("source".to_string(), json!(doc.source));
    metadata.insert("chunk_index".to_string(), json!(chunk.index));
    metadata.insert("total_chunks".to_string(), json!(chunk.total));

    VectorRecord {
        id: chunk.id.clone(),
        values,
        metadata,
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern)
                .map_err(|e| Error::config(format!("invalid glob '{}': {}", pattern, e)))?,
        );
    }
    builder
        .build()
        .map_err(|e| Error::config(format!("invalid glob set: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::fs;

    fn ingest_config(root: &Path) -> IngestConfig {
        IngestConfig {
            root: root.to_path_buf(),
            include_globs: vec!["**/*.md".to_string(), "**/*.txt".to_string()],
            exclude_globs: Vec::new(),
        }
    }

    #[test]
    fn test_discovery_filters_and_sorts() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("beta.md"), "beta body").unwrap();
        fs::write(tmp.path().join("alpha.txt"), "alpha body").unwrap();
        fs::write(tmp.path().join("ignored.rs"), "fn main() {}").unwrap();

        let docs = discover_documents(&ingest_config(tmp.path())).unwrap();
        let sources: Vec<&str> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["alpha.txt", "beta.md"]);
        assert_eq!(docs[0].body, "alpha body");
        assert_eq!(docs[0].title, "alpha.txt");
    }

    #[test]
    fn test_discovery_applies_excludes() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("notes")).unwrap();
        fs::create_dir_all(tmp.path().join("node_modules/pkg")).unwrap();
        fs::write(tmp.path().join("notes/keep.md"), "keep").unwrap();
        fs::write(tmp.path().join("node_modules/pkg/skip.md"), "skip").unwrap();

        let docs = discover_documents(&ingest_config(tmp.path())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "notes/keep.md");
    }

    #[test]
    fn test_missing_root_is_a_config_error() {
        let err = discover_documents(&ingest_config(Path::new("/nonexistent/akb"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_document_id_is_stable() {
        assert_eq!(document_id("notes/a.md"), document_id("notes/a.md"));
        assert_ne!(document_id("notes/a.md"), document_id("notes/b.md"));
        assert_eq!(document_id("notes/a.md").len(), 16);
    }

    #[test]
    fn test_build_record_metadata() {
        let mut doc_meta = Map::new();
        doc_meta.insert("category".to_string(), json!("notes"));
        let doc = Document {
            id: "d1".to_string(),
            title: "Notes".to_string(),
            source: "notes.md".to_string(),
            body: "irrelevant".to_string(),
            metadata: doc_meta,
        };
        let chunk = Chunk {
            id: "d1_chunk_2".to_string(),
            document_id: "d1".to_string(),
            index: 2,
            total: 5,
            start: 10,
            end: 20,
            text: "chunk text".to_string(),
        };

        let record = build_record(&doc, &chunk, vec![0.1, 0.2]);
        assert_eq!(record.id, "d1_chunk_2");
        assert_eq!(record.metadata["text"], "chunk text");
        assert_eq!(record.metadata["title"], "Notes");
        assert_eq!(record.metadata["source"], "notes.md");
        assert_eq!(record.metadata["chunk_index"], 2);
        assert_eq!(record.metadata["total_chunks"], 5);
        assert_eq!(record.metadata["category"], "notes");
    }
}
