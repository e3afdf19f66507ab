//! Core data models used throughout docintel.
//!
//! These types represent the documents, chunks, citations, and query
//! records that flow through the ingestion and answering pipeline.

use serde::{Deserialize, Serialize};

/// Text extracted from a single PDF page (1-based page number).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page: i64,
    pub text: String,
}

impl PageText {
    pub fn new(page: i64, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// An uploaded document. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub source_path: String,
    /// SHA-256 of the uploaded bytes, used to reject duplicate uploads.
    pub content_hash: String,
    pub page_count: i64,
    pub chunk_count: i64,
    /// Unix seconds.
    pub uploaded_at: i64,
}

/// A chunk of one page's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    /// 1-based page the text came from.
    pub page: i64,
    /// Position within the whole document, contiguous from 0.
    pub chunk_index: i64,
    /// Position within its page, contiguous from 0.
    pub page_chunk: i64,
    pub text: String,
    pub hash: String,
}

/// A chunk returned from vector search, joined with its document.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub page: i64,
    pub chunk_index: i64,
    pub text: String,
    /// Cosine similarity to the query vector.
    pub score: f32,
}

/// A source reference attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub document_id: String,
    pub source: String,
    pub page: i64,
    pub chunk_id: String,
    pub score: f32,
    pub content_preview: String,
}

/// A prior question/answer pair supplied as conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Error,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "success" {
            QueryStatus::Success
        } else {
            QueryStatus::Error
        }
    }
}

/// One entry in the append-only query history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRecord {
    pub id: String,
    pub question: String,
    pub answer: Option<String>,
    /// Chunk ids in descending similarity order.
    pub retrieved_chunk_ids: Vec<String>,
    pub sources: Vec<Citation>,
    pub latency_ms: i64,
    /// Unix seconds.
    pub created_at: i64,
    pub status: QueryStatus,
    pub error: Option<String>,
}

/// Aggregate counts over the whole collection.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionStats {
    pub total_documents: i64,
    pub total_chunks: i64,
    pub total_queries: i64,
    pub avg_latency_ms: Option<f64>,
}
