//! # askbase
//!
//! A retrieval-augmented question answering CLI over pluggable vector stores.
//!
//! askbase ingests local documents into a remote vector-similarity store
//! (chunk → embed → upsert) and answers free-text questions by letting a
//! chat model decide, through a single-round tool call, whether to search
//! that knowledge base before answering.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Files    │──▶│   Pipeline   │──▶│  Vector store  │
//! │ (md/txt)  │   │ Chunk+Embed  │   │ Pinecone/Qdrant│
//! └───────────┘   └──────────────┘   └───────┬───────┘
//!                                            │ search
//!                 ┌──────────────┐   ┌───────┴───────┐
//!                 │  Chat model  │◀─▶│   Responder    │
//!                 │ (tool calls) │   │ (one round)    │
//!                 └──────────────┘   └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! akb init                      # create/verify the store collection
//! akb ingest                    # chunk, embed, and upsert local docs
//! akb search "deployment"      # raw similarity search
//! akb ask "how do we deploy?"  # retrieval-augmented answer
//! akb export --output kb.json  # dump the store
//! akb migrate qdrant           # copy the store to another provider
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Error taxonomy (config / service / protocol) |
//! | [`models`] | Core data types |
//! | [`chunk`] | Fixed-stride overlap chunker |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`model`] | Chat model client and tool-call types |
//! | [`responder`] | Single-round retrieval-augmented responder |
//! | [`store`] | Vector store trait and adapters |
//! | [`ingest`] | Ingestion pipeline |
//! | [`search`] | Raw similarity search command |
//! | [`ask`] | Question answering command |
//! | [`export`] | Store export |
//! | [`migrate`] | Store-to-store migration |

pub mod ask;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod export;
pub mod ingest;
pub mod migrate;
pub mod model;
pub mod models;
pub mod responder;
pub mod search;
pub mod store;
