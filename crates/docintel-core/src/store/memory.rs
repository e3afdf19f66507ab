//! In-memory [`VectorStore`] implementation for tests.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Search is brute-force cosine
//! similarity over every stored vector, exactly like the SQLite store.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{Chunk, CollectionStats, Document, QueryRecord, ScoredChunk};

use super::{check_batch, rank, VectorStore};

struct StoredChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// In-memory store. Documents are kept in insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<Vec<Document>>,
    chunks: RwLock<Vec<StoredChunk>>,
    queries: RwLock<Vec<QueryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn insert_document(
        &self,
        doc: &Document,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        _model: &str,
    ) -> Result<()> {
        check_batch(chunks, vectors)?;
        let mut docs = write(&self.docs)?;
        if docs.iter().any(|d| d.id == doc.id) {
            anyhow::bail!("document {} already exists", doc.id);
        }
        let mut stored = write(&self.chunks)?;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            stored.push(StoredChunk {
                chunk: chunk.clone(),
                vector: vector.clone(),
            });
        }
        let mut doc = doc.clone();
        doc.chunk_count = chunks.len() as i64;
        docs.push(doc);
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(read(&self.docs)?.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        Ok(read(&self.docs)?
            .iter()
            .find(|d| d.content_hash == content_hash)
            .cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = read(&self.docs)?.iter().rev().cloned().collect();
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(docs)
    }

    async fn delete_document(&self, id: &str) -> Result<Option<i64>> {
        let mut docs = write(&self.docs)?;
        let Some(pos) = docs.iter().position(|d| d.id == id) else {
            return Ok(None);
        };
        docs.remove(pos);
        let mut chunks = write(&self.chunks)?;
        let before = chunks.len();
        chunks.retain(|sc| sc.chunk.document_id != id);
        Ok(Some((before - chunks.len()) as i64))
    }

    async fn search(
        &self,
        query_vec: &[f32],
        k: usize,
        source: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let docs = read(&self.docs)?;
        let chunks = read(&self.chunks)?;
        let mut candidates: Vec<ScoredChunk> = chunks
            .iter()
            .filter(|sc| sc.vector.len() == query_vec.len())
            .filter_map(|sc| {
                let doc = docs.iter().find(|d| d.id == sc.chunk.document_id)?;
                if source.is_some_and(|s| s != doc.filename) {
                    return None;
                }
                Some(ScoredChunk {
                    chunk_id: sc.chunk.id.clone(),
                    document_id: doc.id.clone(),
                    filename: doc.filename.clone(),
                    page: sc.chunk.page,
                    chunk_index: sc.chunk.chunk_index,
                    text: sc.chunk.text.clone(),
                    score: cosine_similarity(query_vec, &sc.vector),
                })
            })
            .collect();
        rank(&mut candidates, k);
        Ok(candidates)
    }

    async fn stats(&self) -> Result<CollectionStats> {
        let queries = read(&self.queries)?;
        let avg_latency_ms = if queries.is_empty() {
            None
        } else {
            Some(queries.iter().map(|q| q.latency_ms as f64).sum::<f64>() / queries.len() as f64)
        };
        Ok(CollectionStats {
            total_documents: read(&self.docs)?.len() as i64,
            total_chunks: read(&self.chunks)?.len() as i64,
            total_queries: queries.len() as i64,
            avg_latency_ms,
        })
    }

    async fn reset(&self) -> Result<()> {
        write(&self.docs)?.clear();
        write(&self.chunks)?.clear();
        write(&self.queries)?.clear();
        Ok(())
    }

    async fn append_query(&self, record: &QueryRecord) -> Result<()> {
        write(&self.queries)?.push(record.clone());
        Ok(())
    }

    async fn list_queries(&self, limit: Option<usize>) -> Result<Vec<QueryRecord>> {
        let queries = read(&self.queries)?;
        let take = limit.unwrap_or(queries.len());
        Ok(queries.iter().rev().take(take).cloned().collect())
    }
}
