//! Export the vector store as JSON.
//!
//! Produces an envelope with an export timestamp, the store name, and a
//! `vectors` array of every record (id, values, metadata), suitable for
//! backup or inspection.

use chrono::Utc;
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::VectorRecord;
use crate::store;

#[derive(Serialize)]
struct ExportData {
    exported_at: String,
    store: String,
    vectors: Vec<VectorRecord>,
}

/// Export every record from the configured store.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes to
/// stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = store::create_store(config)?;
    let vectors = store.dump().await?;
    let count = vectors.len();

    let data = ExportData {
        exported_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        store: store.name().to_string(),
        vectors,
    };
    let json = serde_json::to_string_pretty(&data)
        .map_err(|e| Error::service("export", e))?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::config(format!("cannot create {}: {}", parent.display(), e)))?;
            }
            std::fs::write(path, &json)
                .map_err(|e| Error::config(format!("cannot write {}: {}", path.display(), e)))?;
            eprintln!("Exported {} vectors to {}", count, path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
