use std::sync::Arc;

use crate::config::Config;
use crate::embedding;
use crate::error::{Error, Result};
use crate::model::OpenAiChatModel;
use crate::responder::Responder;
use crate::store;

/// CLI entry point for `akb ask` — one question, one answer.
pub async fn run_ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    if question.trim().is_empty() {
        return Err(Error::config("question must not be empty"));
    }

    if !config.embedding.is_enabled() {
        return Err(Error::config(
            "ask requires an embedding provider. Set [embedding] provider in config.",
        ));
    }

    let model = OpenAiChatModel::new(&config.llm)?;
    let provider: Arc<dyn embedding::EmbeddingProvider> =
        Arc::from(embedding::create_provider(&config.embedding)?);
    let store: Arc<dyn store::VectorStore> = Arc::from(store::create_store(config)?);

    let responder = Responder::new(
        Arc::new(model),
        provider,
        store,
        top_k.unwrap_or(config.retrieval.top_k),
    );

    let answer = responder.answer(question).await?;

    if let Some(trace) = &answer.retrieval {
        eprintln!(
            "retrieved {} chunks for \"{}\" (top_k {})",
            trace.hits, trace.query, trace.top_k
        );
    }
    println!("{}", answer.text);

    Ok(())
}
