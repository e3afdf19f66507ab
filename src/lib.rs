//! # docintel
//!
//! Ask questions about your PDF documents and get answers grounded in their
//! content, with page-level citations.
//!
//! Uploaded PDFs are split into pages, chunked, embedded, and stored in a
//! local SQLite database. A question is embedded the same way, the most
//! similar chunks are retrieved, and a language model answers using only
//! that context.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  PDF upload │──▶│ Extract+Chunk│──▶│    SQLite    │
//! │  CLI / HTTP │   │    +Embed    │   │ chunks+vecs  │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │ top-K
//!                        ┌────────────────────┤
//!                        ▼                    ▼
//!                 ┌──────────────┐     ┌──────────────┐
//!                 │  RAG chain   │────▶│   LLM with   │
//!                 │ (DocumentRag)│     │  citations   │
//!                 └──────────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docintel init
//! docintel upload report.pdf
//! docintel query "What are the main findings?"
//! docintel serve                # REST API + web UI on :8000
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite-backed vector store |
//! | [`extract`] | Per-page PDF text extraction |
//! | [`http`] | Provider HTTP client and retry policy |
//! | [`embedding`] | Embedding providers |
//! | [`generation`] | LLM providers |
//! | [`rag_system`] | The `DocumentRag` facade |
//! | [`server`] | REST server and web UI |
//! | [`dashboard`] | HTML report generation |
//! | [`documents`], [`ask`], [`stats`] | CLI commands |

pub mod ask;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod documents;
pub mod embedding;
pub mod extract;
pub mod generation;
pub mod http;
pub mod migrate;
pub mod rag_system;
pub mod server;
pub mod sqlite_store;
pub mod stats;
