//! Embeds a chunked document and hands it to the store.

use anyhow::{Context, Result};

use crate::embedding::Embedder;
use crate::error::RagError;
use crate::models::{Chunk, Document};
use crate::store::VectorStore;

/// Embed `chunks` in batches of `batch_size` and store them with `doc`.
///
/// Returns the number of chunks stored. Nothing is written unless every
/// batch embeds successfully.
pub async fn index_document(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    doc: &Document,
    chunks: &[Chunk],
    batch_size: usize,
) -> Result<usize> {
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embedded = embedder
            .embed(&texts)
            .await
            .with_context(|| format!("embedding chunks of '{}'", doc.filename))?;
        if embedded.len() != batch.len() {
            return Err(RagError::provider(format!(
                "embedder returned {} vectors for {} chunks",
                embedded.len(),
                batch.len()
            ))
            .into());
        }
        vectors.extend(embedded);
    }

    store
        .insert_document(doc, chunks, &vectors, embedder.model_name())
        .await
        .with_context(|| RagError::Storage(format!("storing '{}'", doc.filename)))?;
    Ok(chunks.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{chunk_pages, TextSplitter};
    use crate::error::{classify, ErrorKind};
    use crate::models::PageText;
    use crate::store::memory::InMemoryStore;
    use crate::testing::KeywordEmbedder;
    use async_trait::async_trait;

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0]])
        }
    }

    fn doc() -> Document {
        Document {
            id: "d1".to_string(),
            filename: "a.pdf".to_string(),
            source_path: "a.pdf".to_string(),
            content_hash: "h".to_string(),
            page_count: 3,
            chunk_count: 0,
            uploaded_at: 0,
        }
    }

    fn chunks() -> Vec<Chunk> {
        let pages: Vec<PageText> = (1..=3)
            .map(|p| PageText::new(p, format!("Page {} text.", p)))
            .collect();
        chunk_pages("d1", &pages, &TextSplitter::new(1000, 200))
    }

    #[tokio::test]
    async fn test_index_stores_all_chunks() {
        let store = InMemoryStore::new();
        let n = index_document(&store, &KeywordEmbedder, &doc(), &chunks(), 2)
            .await
            .unwrap();
        assert_eq!(n, 3);
        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs[0].chunk_count, 3);
    }

    #[tokio::test]
    async fn test_short_batch_stores_nothing() {
        let store = InMemoryStore::new();
        let err = index_document(&store, &ShortEmbedder, &doc(), &chunks(), 8)
            .await
            .unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Provider);
        assert!(store.list_documents().await.unwrap().is_empty());
    }
}
