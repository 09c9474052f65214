use crate::config::Config;
use crate::embedding::{self, embed_query};
use crate::error::{Error, Result};
use crate::store;

pub async fn run_search(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    if !config.embedding.is_enabled() {
        return Err(Error::config(
            "search requires an embedding provider. Set [embedding] provider in config.",
        ));
    }

    let provider = embedding::create_provider(&config.embedding)?;
    let store = store::create_store(config)?;

    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let query_vector = embed_query(provider.as_ref(), query).await?;
    let hits = store.search(&query_vector, top_k).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let title = hit
            .metadata
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("(untitled)");
        let source = hit
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("(unknown)");

        println!("{}. [{:.2}] {} / {}", i + 1, hit.score, source, title);
        let excerpt: String = hit.text.chars().take(240).collect();
        println!("    excerpt: \"{}\"", excerpt.replace('\n', " ").trim());
        println!("    id: {}", hit.id);
        println!();
    }

    Ok(())
}
