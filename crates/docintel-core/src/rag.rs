//! The retrieval-augmented answer chain.
//!
//! ```text
//! question ──► Embedder::embed_query ──► VectorStore::search (top-K)
//!          ──► similarity threshold ──► PromptBuilder::build
//!          ──► Generator::generate ──► answer + citations
//! ```
//!
//! Empty retrieval is an error: no context means no answer is generated,
//! so the model is never asked to answer from nothing.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::embedding::Embedder;
use crate::error::RagError;
use crate::generation::Generator;
use crate::models::{Citation, ScoredChunk, Turn};
use crate::prompt::{format_sources, PromptBuilder};
use crate::store::VectorStore;

/// Retrieval knobs, fixed for the lifetime of a chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Chunks scoring below this are dropped before prompting.
    pub similarity_threshold: Option<f32>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            similarity_threshold: None,
        }
    }
}

/// A generated answer with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<Citation>,
    /// Every chunk used as context, in descending similarity order.
    pub retrieved: Vec<ScoredChunk>,
}

impl RagAnswer {
    pub fn retrieved_chunk_ids(&self) -> Vec<String> {
        self.retrieved.iter().map(|c| c.chunk_id.clone()).collect()
    }
}

pub struct RagChain {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    settings: RetrievalSettings,
}

impl RagChain {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            settings,
        }
    }

    /// Embed `question` and return the chunks that pass the threshold.
    ///
    /// Fails with [`RagError::EmptyRetrieval`] when nothing qualifies.
    pub async fn retrieve(&self, question: &str, source: Option<&str>) -> Result<Vec<ScoredChunk>> {
        let query_vec = self
            .embedder
            .embed_query(question)
            .await
            .context("embedding question")?;

        let mut hits = self
            .store
            .search(&query_vec, self.settings.top_k.max(1), source)
            .await
            .with_context(|| RagError::Storage("searching indexed chunks".to_string()))?;

        if hits.is_empty() {
            let reason = match source {
                Some(s) => format!("no indexed chunks for source '{}'", s),
                None => "no documents have been uploaded".to_string(),
            };
            return Err(RagError::EmptyRetrieval(reason).into());
        }

        if let Some(threshold) = self.settings.similarity_threshold {
            hits.retain(|h| h.score >= threshold);
            if hits.is_empty() {
                return Err(RagError::EmptyRetrieval(format!(
                    "no chunk reached the similarity threshold of {}",
                    threshold
                ))
                .into());
            }
        }

        Ok(hits)
    }

    /// Answer `question` from the indexed documents.
    pub async fn answer(
        &self,
        question: &str,
        source: Option<&str>,
        history: &[Turn],
    ) -> Result<RagAnswer> {
        if question.trim().is_empty() {
            return Err(RagError::invalid_input("question must not be empty").into());
        }

        let retrieved = self.retrieve(question, source).await?;
        let prompt = PromptBuilder::build(question, &retrieved, history);
        let answer = self
            .generator
            .generate(&prompt)
            .await
            .context("generating answer")?;

        Ok(RagAnswer {
            answer: answer.trim().to_string(),
            sources: format_sources(&retrieved),
            retrieved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{chunk_pages, TextSplitter};
    use crate::error::{classify, ErrorKind};
    use crate::indexer::index_document;
    use crate::models::{Document, PageText};
    use crate::store::memory::InMemoryStore;
    use crate::testing::{EchoGenerator, FailingGenerator, KeywordEmbedder};

    fn doc(id: &str, filename: &str) -> Document {
        Document {
            id: id.to_string(),
            filename: filename.to_string(),
            source_path: filename.to_string(),
            content_hash: id.to_string(),
            page_count: 3,
            chunk_count: 0,
            uploaded_at: 0,
        }
    }

    async fn indexed_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let pages = vec![
            PageText::new(1, "Apples are red fruit."),
            PageText::new(2, "Bridges span rivers."),
            PageText::new(3, "Comets orbit the sun."),
        ];
        let chunks = chunk_pages("d1", &pages, &TextSplitter::new(1000, 200));
        index_document(store.as_ref(), &KeywordEmbedder, &doc("d1", "facts.pdf"), &chunks, 2)
            .await
            .unwrap();
        store
    }

    fn chain(store: Arc<InMemoryStore>, generator: Arc<dyn Generator>, top_k: usize) -> RagChain {
        RagChain::new(
            store,
            Arc::new(KeywordEmbedder),
            generator,
            RetrievalSettings {
                top_k,
                similarity_threshold: None,
            },
        )
    }

    #[tokio::test]
    async fn test_answer_cites_best_page() {
        let store = indexed_store().await;
        let chain = chain(store, Arc::new(EchoGenerator), 1);
        let answer = chain.answer("Tell me about bridges", None, &[]).await.unwrap();
        assert_eq!(answer.retrieved.len(), 1);
        assert_eq!(answer.sources[0].page, 2);
        assert_eq!(answer.sources[0].source, "facts.pdf");
        assert!(answer.answer.contains("[Source: facts.pdf, Page: 2]"));
    }

    #[tokio::test]
    async fn test_empty_store_is_error() {
        let store = Arc::new(InMemoryStore::new());
        let chain = chain(store, Arc::new(EchoGenerator), 4);
        let err = chain.answer("What is this about?", None, &[]).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::EmptyRetrieval);
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let store = indexed_store().await;
        let chain = chain(store, Arc::new(EchoGenerator), 4);
        let err = chain.answer("   ", None, &[]).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_generator_failure_is_provider_error() {
        let store = indexed_store().await;
        let chain = chain(store, Arc::new(FailingGenerator), 4);
        let err = chain.answer("comets", None, &[]).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Provider);
    }

    #[tokio::test]
    async fn test_threshold_filters_everything() {
        let store = indexed_store().await;
        let chain = RagChain::new(
            store,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoGenerator),
            RetrievalSettings {
                top_k: 4,
                similarity_threshold: Some(0.99),
            },
        );
        let err = chain.answer("zebra xylophone", None, &[]).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::EmptyRetrieval);
    }

    #[tokio::test]
    async fn test_retrieval_is_deterministic() {
        let store = indexed_store().await;
        let chain = chain(store, Arc::new(EchoGenerator), 3);
        let a = chain.answer("red fruit orbit", None, &[]).await.unwrap();
        let b = chain.answer("red fruit orbit", None, &[]).await.unwrap();
        assert_eq!(a.retrieved_chunk_ids(), b.retrieved_chunk_ids());
        assert_eq!(a.retrieved_chunk_ids().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_source_filter() {
        let store = indexed_store().await;
        let chain = chain(store, Arc::new(EchoGenerator), 4);
        let err = chain.answer("apples", Some("other.pdf"), &[]).await.unwrap_err();
        assert_eq!(classify(&err), ErrorKind::EmptyRetrieval);
        assert!(format!("{:#}", err).contains("other.pdf"));
    }
}
