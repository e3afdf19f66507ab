//! Storage abstraction for docintel.
//!
//! The [`VectorStore`] trait covers everything the ingestion and answering
//! pipeline needs: documents with their chunks and vectors, top-K
//! similarity search, and the append-only query history. The SQLite
//! implementation lives in the app crate; [`memory::InMemoryStore`] backs
//! tests.
//!
//! Implementations must be `Send + Sync` to be shared across async tasks.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chunk, CollectionStats, Document, QueryRecord, ScoredChunk};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_document`](VectorStore::insert_document) | Store a document with its chunks and vectors, atomically |
/// | [`get_document`](VectorStore::get_document) | Look a document up by id |
/// | [`find_by_hash`](VectorStore::find_by_hash) | Look a document up by content hash |
/// | [`list_documents`](VectorStore::list_documents) | All documents, newest first |
/// | [`delete_document`](VectorStore::delete_document) | Remove a document, its chunks and vectors |
/// | [`search`](VectorStore::search) | Top-K cosine similarity search |
/// | [`stats`](VectorStore::stats) | Collection counts |
/// | [`reset`](VectorStore::reset) | Remove everything, including query history |
/// | [`append_query`](VectorStore::append_query) | Record a query |
/// | [`list_queries`](VectorStore::list_queries) | Query history, newest first |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a document together with its chunks and one vector per chunk.
    ///
    /// Either everything is stored or nothing is.
    async fn insert_document(
        &self,
        doc: &Document,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<Document>>;

    /// All documents with derived chunk counts, most recently uploaded first.
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// Delete a document and everything hanging off it.
    ///
    /// Returns the number of chunks removed, or `None` if the id is unknown.
    async fn delete_document(&self, id: &str) -> Result<Option<i64>>;

    /// The `k` stored chunks most similar to `query_vec`.
    ///
    /// `source` restricts results to documents with that filename.
    /// Vectors of a different dimensionality are skipped. Ordering is
    /// deterministic, see [`rank`].
    async fn search(
        &self,
        query_vec: &[f32],
        k: usize,
        source: Option<&str>,
    ) -> Result<Vec<ScoredChunk>>;

    async fn stats(&self) -> Result<CollectionStats>;

    /// Remove all documents, chunks, vectors and query records.
    async fn reset(&self) -> Result<()>;

    async fn append_query(&self, record: &QueryRecord) -> Result<()>;

    /// Query history, newest first, optionally capped at `limit`.
    async fn list_queries(&self, limit: Option<usize>) -> Result<Vec<QueryRecord>>;
}

/// Sort candidates by descending score, ties broken by ascending chunk id,
/// and keep the first `k`.
pub fn rank(candidates: &mut Vec<ScoredChunk>, k: usize) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
    candidates.truncate(k);
}

/// Reject mismatched chunk/vector batches before touching storage.
pub fn check_batch(chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
    if chunks.len() != vectors.len() {
        anyhow::bail!(
            "chunk/vector count mismatch: {} chunks, {} vectors",
            chunks.len(),
            vectors.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(id: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk_id: id.to_string(),
            document_id: "d".to_string(),
            filename: "f.pdf".to_string(),
            page: 1,
            chunk_index: 0,
            text: String::new(),
            score,
        }
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let mut c = vec![cand("a", 0.1), cand("b", 0.9), cand("c", 0.5)];
        rank(&mut c, 2);
        let ids: Vec<_> = c.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_rank_ties_by_id() {
        let mut c = vec![cand("z", 0.5), cand("m", 0.5), cand("a", 0.5)];
        rank(&mut c, 3);
        let ids: Vec<_> = c.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }
}
