//! The `DocumentRag` facade.
//!
//! This is the single integration point used by the CLI, the HTTP server
//! and the dashboard generator. Every public operation returns an
//! [`OpResult`]: either `{"status": "success", ...payload}` or
//! `{"status": "error", "kind": ..., "message": ...}`. Failures never
//! escape as Rust errors.
//!
//! # Upload pipeline
//!
//! ```text
//! path/bytes ─► validate (.pdf, size) ─► SHA-256 dedup ─► extract pages
//!            ─► chunk per page ─► embed in batches ─► store (one transaction)
//! ```
//!
//! # Query pipeline
//!
//! ```text
//! question ─► RagChain (embed, top-K, prompt, generate) ─► citations
//!          ─► query record appended to history (success or error)
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use docintel_core::chunk::{chunk_pages, TextSplitter};
use docintel_core::embedding::Embedder;
use docintel_core::error::{classify, ErrorKind, RagError};
use docintel_core::generation::Generator;
use docintel_core::indexer::index_document;
use docintel_core::models::{
    Citation, CollectionStats, Document, PageText, QueryRecord, QueryStatus, Turn,
};
use docintel_core::rag::RagChain;
use docintel_core::store::VectorStore;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::extract;
use crate::generation::create_generator;
use crate::sqlite_store::SqliteStore;
use crate::{db, migrate};

/// Status-tagged result of a facade operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpResult<T> {
    Success(T),
    Error(OpError),
}

#[derive(Debug, Clone, Serialize, PartialEq, Error)]
#[error("{message}")]
pub struct OpError {
    pub kind: ErrorKind,
    pub message: String,
}

impl<T> OpResult<T> {
    pub(crate) fn from_result(operation: &str, res: Result<T>) -> Self {
        match res {
            Ok(v) => OpResult::Success(v),
            Err(e) => {
                let kind = classify(&e);
                let message = format!("{:#}", e);
                tracing::warn!(operation, kind = kind.as_str(), error = %message, "operation failed");
                OpResult::Error(OpError { kind, message })
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OpResult::Success(_))
    }

    pub fn into_result(self) -> std::result::Result<T, OpError> {
        match self {
            OpResult::Success(v) => Ok(v),
            OpResult::Error(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub message: String,
    pub document_id: String,
    pub filename: String,
    pub pages: i64,
    pub chunks_created: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query_id: String,
    pub question: String,
    pub answer: String,
    pub sources: Vec<Citation>,
    pub retrieved_chunk_ids: Vec<String>,
    pub latency_ms: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentList {
    pub total: usize,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub message: String,
    pub document_id: String,
    pub filename: String,
    pub chunks_removed: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetReport {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryHistory {
    pub total: usize,
    pub queries: Vec<QueryRecord>,
}

/// Stands in for a provider that could not be built (e.g. missing API
/// key), so listing and deleting still work and only embedding or
/// generation reports the problem.
struct Unavailable {
    reason: String,
}

impl Unavailable {
    fn from_error(e: &anyhow::Error) -> Self {
        let reason = match e.downcast_ref::<RagError>() {
            Some(RagError::Config(msg)) => msg.clone(),
            _ => format!("{:#}", e),
        };
        Self { reason }
    }
}

#[async_trait]
impl Embedder for Unavailable {
    fn model_name(&self) -> &str {
        "unavailable"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RagError::config(self.reason.clone()).into())
    }
}

#[async_trait]
impl Generator for Unavailable {
    fn model_name(&self) -> &str {
        "unavailable"
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RagError::config(self.reason.clone()).into())
    }
}

pub struct DocumentRag {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator_model: String,
    chain: RagChain,
    splitter: TextSplitter,
    batch_size: usize,
    max_upload_bytes: u64,
}

impl DocumentRag {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: &Config,
    ) -> Self {
        let generator_model = generator.model_name().to_string();
        let chain = RagChain::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            generator,
            config.retrieval_settings(),
        );
        Self {
            store,
            embedder,
            generator_model,
            chain,
            splitter: config.splitter(),
            batch_size: config.embedding.batch_size,
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }

    /// Open the SQLite store and build the configured providers.
    ///
    /// A provider that cannot be built is replaced by one that reports the
    /// configuration error on use.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config)
            .await
            .with_context(|| format!("opening {}", config.db_path().display()))?;
        migrate::apply(&pool).await?;
        let store: Arc<dyn VectorStore> = Arc::new(SqliteStore::new(pool));

        let embedder: Arc<dyn Embedder> = match create_embedder(&config.embedding) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "embedding provider unavailable");
                Arc::new(Unavailable::from_error(&e))
            }
        };
        let generator: Arc<dyn Generator> = match create_generator(&config.llm) {
            Ok(g) => g,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "llm provider unavailable");
                Arc::new(Unavailable::from_error(&e))
            }
        };

        Ok(Self::new(store, embedder, generator, config))
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn embedder_model(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn generator_model(&self) -> &str {
        &self.generator_model
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    // ============ Upload ============

    /// Upload a PDF from disk.
    pub async fn upload_document(&self, path: &Path) -> OpResult<UploadReport> {
        OpResult::from_result("upload_document", self.try_upload_path(path).await)
    }

    /// Upload PDF bytes received from a client.
    pub async fn upload_bytes(&self, filename: &str, bytes: Vec<u8>) -> OpResult<UploadReport> {
        OpResult::from_result(
            "upload_bytes",
            self.try_upload_bytes(filename, filename, bytes).await,
        )
    }

    /// Index text that has already been split into pages.
    ///
    /// The content hash is taken over the page texts.
    pub async fn upload_pages(&self, filename: &str, pages: Vec<PageText>) -> OpResult<UploadReport> {
        let mut hasher = Sha256::new();
        for page in &pages {
            hasher.update(page.page.to_le_bytes());
            hasher.update(page.text.as_bytes());
        }
        let hash = format!("{:x}", hasher.finalize());
        OpResult::from_result(
            "upload_pages",
            self.try_index_pages(filename, filename, hash, pages).await,
        )
    }

    async fn try_upload_path(&self, path: &Path) -> Result<UploadReport> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| RagError::invalid_input(format!("not a file: {}", path.display())))?;
        check_pdf_name(&filename)?;

        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            RagError::ingestion(&filename, format!("cannot read {}: {}", path.display(), e))
        })?;
        self.check_size(meta.len())?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            RagError::ingestion(&filename, format!("cannot read {}: {}", path.display(), e))
        })?;
        let source_path = path.display().to_string();
        self.try_upload_bytes(&filename, &source_path, bytes).await
    }

    async fn try_upload_bytes(
        &self,
        filename: &str,
        source_path: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReport> {
        check_pdf_name(filename)?;
        self.check_size(bytes.len() as u64)?;

        let hash = format!("{:x}", Sha256::digest(&bytes));
        if let Some(existing) = self.store.find_by_hash(&hash).await? {
            return Err(duplicate_of(filename, &existing));
        }

        let pages = tokio::task::spawn_blocking(move || extract::extract_pages(&bytes))
            .await
            .map_err(|e| RagError::ingestion(filename, format!("PDF parser crashed: {}", e)))?
            .map_err(|e| RagError::ingestion(filename, e.to_string()))?;

        self.try_index_pages(filename, source_path, hash, pages).await
    }

    async fn try_index_pages(
        &self,
        filename: &str,
        source_path: &str,
        content_hash: String,
        pages: Vec<PageText>,
    ) -> Result<UploadReport> {
        if let Some(existing) = self.store.find_by_hash(&content_hash).await? {
            return Err(duplicate_of(filename, &existing));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let chunks = chunk_pages(&id, &pages, &self.splitter);
        if chunks.is_empty() {
            return Err(RagError::ingestion(filename, "PDF contains no extractable text").into());
        }

        let doc = Document {
            id: id.clone(),
            filename: filename.to_string(),
            source_path: source_path.to_string(),
            content_hash,
            page_count: pages.len() as i64,
            chunk_count: chunks.len() as i64,
            uploaded_at: chrono::Utc::now().timestamp(),
        };

        let stored = match index_document(
            self.store.as_ref(),
            self.embedder.as_ref(),
            &doc,
            &chunks,
            self.batch_size,
        )
        .await
        {
            Ok(n) => n,
            Err(e) => {
                // Another upload of the same bytes committed first.
                if let Ok(Some(existing)) = self.store.find_by_hash(&doc.content_hash).await {
                    return Err(duplicate_of(filename, &existing));
                }
                return Err(e);
            }
        };

        tracing::info!(
            document_id = %id,
            filename,
            pages = doc.page_count,
            chunks = stored,
            "document indexed"
        );

        Ok(UploadReport {
            message: format!("Successfully processed {}", filename),
            document_id: id,
            filename: filename.to_string(),
            pages: doc.page_count,
            chunks_created: stored,
        })
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_upload_bytes {
            return Err(RagError::PayloadTooLarge {
                size,
                limit: self.max_upload_bytes,
            }
            .into());
        }
        Ok(())
    }

    // ============ Query ============

    pub async fn query(&self, question: &str, source_filter: Option<&str>) -> OpResult<QueryReport> {
        self.query_with_history(question, source_filter, &[]).await
    }

    /// Answer `question`, optionally restricted to one source file and
    /// conditioned on earlier turns. The query is recorded either way.
    pub async fn query_with_history(
        &self,
        question: &str,
        source_filter: Option<&str>,
        history: &[Turn],
    ) -> OpResult<QueryReport> {
        let started = Instant::now();
        let result = self.chain.answer(question, source_filter, history).await;
        let latency_ms = started.elapsed().as_millis() as i64;
        let query_id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let (record, outcome) = match result {
            Ok(answer) => {
                let retrieved_chunk_ids = answer.retrieved_chunk_ids();
                tracing::info!(
                    query_id = %query_id,
                    chunks = retrieved_chunk_ids.len(),
                    latency_ms,
                    "query answered"
                );
                let record = QueryRecord {
                    id: query_id.clone(),
                    question: question.to_string(),
                    answer: Some(answer.answer.clone()),
                    retrieved_chunk_ids: retrieved_chunk_ids.clone(),
                    sources: answer.sources.clone(),
                    latency_ms,
                    created_at,
                    status: QueryStatus::Success,
                    error: None,
                };
                let report = QueryReport {
                    query_id,
                    question: question.to_string(),
                    answer: answer.answer,
                    sources: answer.sources,
                    retrieved_chunk_ids,
                    latency_ms,
                };
                (record, Ok(report))
            }
            Err(e) => {
                let record = QueryRecord {
                    id: query_id,
                    question: question.to_string(),
                    answer: None,
                    retrieved_chunk_ids: Vec::new(),
                    sources: Vec::new(),
                    latency_ms,
                    created_at,
                    status: QueryStatus::Error,
                    error: Some(format!("{:#}", e)),
                };
                (record, Err(e))
            }
        };

        if let Err(e) = self.store.append_query(&record).await {
            tracing::warn!(error = %format!("{:#}", e), "failed to record query history");
        }

        OpResult::from_result("query", outcome)
    }

    // ============ Documents ============

    pub async fn get_uploaded_documents(&self) -> OpResult<DocumentList> {
        let res = self.store.list_documents().await.map(|documents| DocumentList {
            total: documents.len(),
            documents,
        });
        OpResult::from_result("get_uploaded_documents", res)
    }

    pub async fn delete_document(&self, id: &str) -> OpResult<DeleteReport> {
        OpResult::from_result("delete_document", self.try_delete(id).await)
    }

    async fn try_delete(&self, id: &str) -> Result<DeleteReport> {
        let doc = self
            .store
            .get_document(id)
            .await?
            .ok_or_else(|| RagError::not_found(format!("document {}", id)))?;
        let removed = self
            .store
            .delete_document(id)
            .await?
            .ok_or_else(|| RagError::not_found(format!("document {}", id)))?;

        tracing::info!(document_id = %id, chunks = removed, "document deleted");
        Ok(DeleteReport {
            message: format!("Deleted {}", doc.filename),
            document_id: id.to_string(),
            filename: doc.filename,
            chunks_removed: removed,
        })
    }

    pub async fn collection_stats(&self) -> OpResult<CollectionStats> {
        OpResult::from_result("collection_stats", self.store.stats().await)
    }

    /// Remove every document, chunk, vector and query record.
    pub async fn reset_collection(&self) -> OpResult<ResetReport> {
        let res = self.store.reset().await.map(|_| {
            tracing::info!("collection reset");
            ResetReport {
                message: "Collection reset successfully".to_string(),
            }
        });
        OpResult::from_result("reset_collection", res)
    }

    pub async fn query_history(&self, limit: Option<usize>) -> OpResult<QueryHistory> {
        let res = self
            .store
            .list_queries(limit)
            .await
            .map(|queries| QueryHistory {
                total: queries.len(),
                queries,
            });
        OpResult::from_result("query_history", res)
    }
}

fn duplicate_of(filename: &str, existing: &Document) -> anyhow::Error {
    RagError::ingestion(
        filename,
        format!(
            "identical content already uploaded as '{}' (document {})",
            existing.filename, existing.id
        ),
    )
    .into()
}

fn check_pdf_name(filename: &str) -> Result<()> {
    let is_pdf = Path::new(filename)
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(RagError::invalid_input(format!(
            "only PDF files are supported, got '{}'",
            filename
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_name_check() {
        assert!(check_pdf_name("report.pdf").is_ok());
        assert!(check_pdf_name("REPORT.PDF").is_ok());
        let err = check_pdf_name("notes.txt").unwrap_err();
        assert_eq!(classify(&err), ErrorKind::InvalidInput);
        assert!(check_pdf_name("pdf").is_err());
    }

    #[test]
    fn test_op_result_serializes_with_status() {
        let ok: OpResult<ResetReport> = OpResult::Success(ResetReport {
            message: "done".to_string(),
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "done");

        let err: OpResult<ResetReport> = OpResult::from_result(
            "test",
            Err(RagError::not_found("document x").into()),
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["message"], "not found: document x");
    }
}
