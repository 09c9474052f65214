//! Retrieval-augmented responder.
//!
//! One invocation runs a single round of tool calling: the question goes to
//! the chat model with the knowledge-base search tool on offer; if the
//! model requests the tool, the extracted query is embedded with the same
//! provider used at ingestion time, the store is searched, and the model is
//! re-invoked with the retrieved passages as the tool result. The second
//! reply is final — a repeated tool request is surfaced verbatim rather
//! than followed.
//!
//! There is no conversation memory across invocations and no retry policy;
//! any service failure aborts the invocation.

use std::sync::Arc;

use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::model::{
    knowledge_tool, ChatMessage, ChatOutcome, GenerativeModel, KNOWLEDGE_TOOL_NAME,
};
use crate::store::VectorStore;

const SYSTEM_PROMPT: &str = "You are a helpful assistant with access to the user's personal \
knowledge base through the search_knowledge_base tool. Search it when the question may be \
covered by stored documents. Answer from the retrieved passages when they are relevant; if \
they are not, you may answer from general knowledge but say that the knowledge base did not \
cover the topic.";

/// Sent as the tool result when the store returns nothing, so the model
/// answers from general knowledge explicitly instead of seeing an empty
/// message.
const NO_MATCHES: &str = "No matching passages were found in the knowledge base.";

/// What one retrieval round looked like, for caller-side reporting.
#[derive(Debug, Clone)]
pub struct RetrievalTrace {
    /// The query string the model asked to search for.
    pub query: String,
    pub top_k: usize,
    /// Number of passages retrieved.
    pub hits: usize,
}

/// The final answer for one invocation.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Present when the model invoked retrieval before answering.
    pub retrieval: Option<RetrievalTrace>,
}

pub struct Responder {
    model: Arc<dyn GenerativeModel>,
    embeddings: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl Responder {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        embeddings: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            model,
            embeddings,
            store,
            default_top_k,
        }
    }

    /// Answer a question, running at most one retrieval round.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let tools = vec![knowledge_tool(self.default_top_k)];
        let mut messages = vec![
            ChatMessage::System(SYSTEM_PROMPT.to_string()),
            ChatMessage::User(question.to_string()),
        ];

        let (call, preface) = match self.model.chat(&messages, &tools).await? {
            ChatOutcome::Answer(text) => {
                return Ok(Answer {
                    text,
                    retrieval: None,
                })
            }
            ChatOutcome::ToolCall { call, preface } => (call, preface),
        };

        if call.name != KNOWLEDGE_TOOL_NAME {
            return Err(Error::protocol(format!(
                "model requested unknown tool '{}'",
                call.name
            )));
        }

        let query = call
            .arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::protocol("tool call missing required string argument 'query'")
            })?
            .to_string();

        let top_k = match call.arguments.get("top_k") {
            None | Some(serde_json::Value::Null) => self.default_top_k,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| Error::protocol("tool call argument 'top_k' must be an integer"))?
                as usize,
        };

        let query_vector = embed_query(self.embeddings.as_ref(), &query).await?;
        let hits = self.store.search(&query_vector, top_k).await?;

        let context = if hits.is_empty() {
            NO_MATCHES.to_string()
        } else {
            hits.iter()
                .map(|h| h.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let trace = RetrievalTrace {
            query,
            top_k,
            hits: hits.len(),
        };

        messages.push(ChatMessage::Assistant {
            text: preface,
            tool_calls: vec![call.clone()],
        });
        messages.push(ChatMessage::ToolResult {
            call_id: call.id.clone(),
            content: context,
        });

        // Final turn. The tool stays on offer so a repeat request can be
        // detected, but it is never followed: its accompanying text is the
        // answer, verbatim.
        let text = match self.model.chat(&messages, &tools).await? {
            ChatOutcome::Answer(text) => text,
            ChatOutcome::ToolCall { preface, .. } => preface.unwrap_or_default(),
        };

        Ok(Answer {
            text,
            retrieval: Some(trace),
        })
    }
}
