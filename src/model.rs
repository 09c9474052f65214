//! Generative model client and chat wire types.
//!
//! The [`GenerativeModel`] trait is the seam between the responder and any
//! chat-completions backend. A single call takes the conversation so far
//! plus the tool specifications on offer and returns a [`ChatOutcome`]: the
//! model either answered directly or requested exactly one tool invocation.
//! Modeling the branch as a tagged union keeps the responder's transitions
//! exhaustive instead of poking at optional fields.
//!
//! [`OpenAiChatModel`] implements the trait against any OpenAI-compatible
//! `/chat/completions` endpoint using the function-calling wire format.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Name of the retrieval tool offered to the model.
pub const KNOWLEDGE_TOOL_NAME: &str = "search_knowledge_base";

/// A message in the chat transcript.
#[derive(Debug, Clone)]
pub enum ChatMessage {
    System(String),
    User(String),
    /// A model turn; carries any text alongside the tool calls it made.
    Assistant {
        text: Option<String>,
        tool_calls: Vec<ToolInvocation>,
    },
    /// The result of executing a tool call, keyed by the call id.
    ToolResult { call_id: String, content: String },
}

/// A tool offered to the model.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: Value,
}

/// A tool invocation requested by the model, with parsed arguments.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// What the model decided to do with a turn.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    /// The model answered directly.
    Answer(String),
    /// The model requested one tool invocation, possibly with leading text.
    ToolCall {
        call: ToolInvocation,
        preface: Option<String>,
    },
}

/// A chat-completions backend.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send the transcript and tool specs, returning the model's decision.
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatOutcome>;
}

/// Build the knowledge-base search tool specification.
///
/// One required string argument (`query`) and an optional result count
/// (`top_k`) that defaults to the configured retrieval size.
pub fn knowledge_tool(default_top_k: usize) -> ToolSpec {
    ToolSpec {
        name: KNOWLEDGE_TOOL_NAME.to_string(),
        description: "Search the user's knowledge base for passages relevant to a query. \
                      Use this whenever the question may be answered by stored documents."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to run against the knowledge base"
                },
                "top_k": {
                    "type": "integer",
                    "description": "Number of passages to retrieve",
                    "default": default_top_k
                }
            },
            "required": ["query"]
        }),
    }
}

// ============ OpenAI-compatible chat client ============

/// Chat client speaking the OpenAI chat-completions wire format.
///
/// Requires the `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAiChatModel {
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::config("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::service("chat model", e))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl GenerativeModel for OpenAiChatModel {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatOutcome> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": wire_messages(messages),
        });
        if let Some(temp) = self.temperature {
            body["temperature"] = json!(temp);
        }
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(wire_tool).collect());
        }

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, tools = tools.len(), "chat request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::service("chat model", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(Error::service(
                "chat model",
                format!("API error {}: {}", status, body_text),
            ));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| Error::service("chat model", e))?;

        parse_chat_response(&json)
    }
}

/// Serialize the transcript to the chat-completions message array.
fn wire_messages(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| match msg {
            ChatMessage::System(text) => json!({ "role": "system", "content": text }),
            ChatMessage::User(text) => json!({ "role": "user", "content": text }),
            ChatMessage::Assistant { text, tool_calls } => {
                let mut out = json!({ "role": "assistant", "content": text });
                if !tool_calls.is_empty() {
                    // Arguments travel as a JSON-encoded string on the wire.
                    out["tool_calls"] = Value::Array(
                        tool_calls
                            .iter()
                            .map(|call| {
                                json!({
                                    "id": call.id,
                                    "type": "function",
                                    "function": {
                                        "name": call.name,
                                        "arguments": call.arguments.to_string(),
                                    }
                                })
                            })
                            .collect(),
                    );
                }
                out
            }
            ChatMessage::ToolResult { call_id, content } => json!({
                "role": "tool",
                "tool_call_id": call_id,
                "content": content,
            }),
        })
        .collect()
}

fn wire_tool(tool: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

/// Map a chat-completions response body onto [`ChatOutcome`].
///
/// Zero tool calls → `Answer`. Exactly one → `ToolCall` with its argument
/// string parsed as JSON. More than one tool call, or arguments that are
/// not valid JSON, violate the single-call contract and fail as protocol
/// errors.
fn parse_chat_response(json: &Value) -> Result<ChatOutcome> {
    let message = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| Error::service("chat model", "response contained no choices"))?;

    let content = message.get("content").and_then(|c| c.as_str());

    let tool_calls = message
        .get("tool_calls")
        .and_then(|t| t.as_array())
        .cloned()
        .unwrap_or_default();

    match tool_calls.len() {
        0 => {
            let text = content.ok_or_else(|| {
                Error::service("chat model", "response contained neither text nor a tool call")
            })?;
            Ok(ChatOutcome::Answer(text.to_string()))
        }
        1 => {
            let call = &tool_calls[0];
            let id = call
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let name = call
                .get("function")
                .and_then(|f| f.get("name"))
                .and_then(|n| n.as_str())
                .ok_or_else(|| Error::protocol("tool call missing function name"))?
                .to_string();
            let raw_args = call
                .get("function")
                .and_then(|f| f.get("arguments"))
                .and_then(|a| a.as_str())
                .unwrap_or("{}");
            let arguments: Value = serde_json::from_str(raw_args).map_err(|e| {
                Error::protocol(format!("tool call arguments are not valid JSON: {}", e))
            })?;

            let preface = content
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from);

            Ok(ChatOutcome::ToolCall {
                call: ToolInvocation {
                    id,
                    name,
                    arguments,
                },
                preface,
            })
        }
        n => Err(Error::protocol(format!(
            "model requested {} tool calls in one turn; expected at most one",
            n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direct_answer() {
        let json = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Paris." } }]
        });
        match parse_chat_response(&json).unwrap() {
            ChatOutcome::Answer(text) => assert_eq!(text, "Paris."),
            other => panic!("expected direct answer, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_tool_call() {
        let json = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "search_knowledge_base",
                            "arguments": "{\"query\": \"favorite foods\", \"top_k\": 5}"
                        }
                    }]
                }
            }]
        });
        match parse_chat_response(&json).unwrap() {
            ChatOutcome::ToolCall { call, preface } => {
                assert_eq!(call.id, "call_1");
                assert_eq!(call.name, KNOWLEDGE_TOOL_NAME);
                assert_eq!(call.arguments["query"], "favorite foods");
                assert_eq!(call.arguments["top_k"], 5);
                assert!(preface.is_none());
            }
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_tool_call_keeps_preface_text() {
        let json = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Let me check.",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "search_knowledge_base", "arguments": "{}" }
                    }]
                }
            }]
        });
        match parse_chat_response(&json).unwrap() {
            ChatOutcome::ToolCall { preface, .. } => {
                assert_eq!(preface.as_deref(), Some("Let me check."));
            }
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_multiple_tool_calls() {
        let call = json!({
            "id": "c",
            "type": "function",
            "function": { "name": "search_knowledge_base", "arguments": "{}" }
        });
        let json = json!({
            "choices": [{
                "message": { "role": "assistant", "content": null, "tool_calls": [call.clone(), call] }
            }]
        });
        let err = parse_chat_response(&json).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_parse_rejects_malformed_arguments() {
        let json = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "c",
                        "type": "function",
                        "function": { "name": "search_knowledge_base", "arguments": "{not json" }
                    }]
                }
            }]
        });
        let err = parse_chat_response(&json).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_parse_rejects_empty_response() {
        let err = parse_chat_response(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, Error::Service { .. }));
    }

    #[test]
    fn test_wire_round_trip_for_tool_messages() {
        let call = ToolInvocation {
            id: "call_9".to_string(),
            name: KNOWLEDGE_TOOL_NAME.to_string(),
            arguments: json!({ "query": "ramen" }),
        };
        let messages = vec![
            ChatMessage::User("What foods are mentioned?".to_string()),
            ChatMessage::Assistant {
                text: None,
                tool_calls: vec![call],
            },
            ChatMessage::ToolResult {
                call_id: "call_9".to_string(),
                content: "The notes mention ramen.".to_string(),
            },
        ];
        let wire = wire_messages(&messages);
        assert_eq!(wire[0]["role"], "user");
        assert_eq!(wire[1]["role"], "assistant");
        assert_eq!(
            wire[1]["tool_calls"][0]["function"]["name"],
            KNOWLEDGE_TOOL_NAME
        );
        // Arguments must be a JSON-encoded string, not an object.
        assert!(wire[1]["tool_calls"][0]["function"]["arguments"].is_string());
        assert_eq!(wire[2]["role"], "tool");
        assert_eq!(wire[2]["tool_call_id"], "call_9");
    }

    #[test]
    fn test_knowledge_tool_schema() {
        let tool = knowledge_tool(3);
        assert_eq!(tool.name, KNOWLEDGE_TOOL_NAME);
        assert_eq!(tool.parameters["required"][0], "query");
        assert_eq!(tool.parameters["properties"]["top_k"]["default"], 3);
    }
}
