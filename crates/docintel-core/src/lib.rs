//! # docintel core
//!
//! Runtime-agnostic logic for docintel: data models, page-aware chunking,
//! the [`Embedder`](embedding::Embedder) and [`Generator`](generation::Generator)
//! capability traits, the [`VectorStore`](store::VectorStore) abstraction,
//! prompt construction, and the retrieval-augmented answer chain.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Concrete providers and the SQLite-backed store live in the `docintel`
//! application crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod indexer;
pub mod models;
pub mod prompt;
pub mod rag;
pub mod store;

#[cfg(test)]
mod testing;
