//! Error types shared across the crate.
//!
//! Three kinds cover everything askbase can fail with:
//!
//! - [`Error::Config`] — invalid chunking parameters, missing credentials,
//!   unknown providers, malformed config files.
//! - [`Error::Service`] — a call to the chat model, the embedding endpoint,
//!   or the vector store failed (network, auth, rate limit, or a response
//!   the client could not parse).
//! - [`Error::Protocol`] — the chat model produced a tool request the
//!   responder cannot honor (unknown tool, malformed arguments).
//!
//! Errors propagate straight to the caller; askbase is a single-shot CLI
//! and does not distinguish transient from permanent failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An external service call failed.
    #[error("{service} error: {message}")]
    Service {
        /// Which service failed (e.g. `"chat model"`, `"pinecone"`).
        service: String,
        /// What went wrong.
        message: String,
    },

    /// The chat model violated the tool-calling contract.
    #[error("tool protocol error: {0}")]
    Protocol(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn service(service: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Service {
            service: service.into(),
            message: message.to_string(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Error::Protocol(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
