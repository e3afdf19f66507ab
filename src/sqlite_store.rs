//! SQLite-backed [`VectorStore`] implementation.
//!
//! Documents, chunks, vectors and query history share one database file
//! inside the persistence directory. Vectors are little-endian `f32`
//! BLOBs; search loads every vector (optionally filtered by filename) and
//! ranks them by cosine similarity in process.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use docintel_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use docintel_core::models::{
    Chunk, Citation, CollectionStats, Document, QueryRecord, QueryStatus, ScoredChunk,
};
use docintel_core::store::{check_batch, rank, VectorStore};

/// SQLite implementation of the [`VectorStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const DOCUMENT_COLUMNS: &str = r#"
    d.id, d.filename, d.source_path, d.content_hash, d.page_count, d.uploaded_at,
    (SELECT COUNT(*) FROM chunks c WHERE c.document_id = d.id) AS chunk_count
"#;

fn row_to_document(row: &SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        filename: row.get("filename"),
        source_path: row.get("source_path"),
        content_hash: row.get("content_hash"),
        page_count: row.get("page_count"),
        chunk_count: row.get("chunk_count"),
        uploaded_at: row.get("uploaded_at"),
    }
}

fn row_to_query(row: &SqliteRow) -> Result<QueryRecord> {
    let ids_json: String = row.get("retrieved_chunk_ids");
    let sources_json: String = row.get("sources_json");
    let status: String = row.get("status");
    Ok(QueryRecord {
        id: row.get("id"),
        question: row.get("question"),
        answer: row.get("answer"),
        retrieved_chunk_ids: serde_json::from_str(&ids_json)?,
        sources: serde_json::from_str::<Vec<Citation>>(&sources_json)?,
        latency_ms: row.get("latency_ms"),
        created_at: row.get("created_at"),
        status: QueryStatus::parse(&status),
        error: row.get("error"),
    })
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn insert_document(
        &self,
        doc: &Document,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()> {
        check_batch(chunks, vectors)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, filename, source_path, content_hash, page_count, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.filename)
        .bind(&doc.source_path)
        .bind(&doc.content_hash)
        .bind(doc.page_count)
        .bind(doc.uploaded_at)
        .execute(&mut *tx)
        .await?;

        for (chunk, vector) in chunks.iter().zip(vectors) {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, document_id, page, chunk_index, page_chunk, text, hash)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(chunk.page)
            .bind(chunk.chunk_index)
            .bind(chunk.page_chunk)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO chunk_vectors (chunk_id, document_id, model, dims, embedding)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(model)
            .bind(vector.len() as i64)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM documents d WHERE d.id = ?",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_document))
    }

    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM documents d WHERE d.content_hash = ?",
            DOCUMENT_COLUMNS
        ))
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_document))
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM documents d ORDER BY d.uploaded_at DESC, d.rowid DESC",
            DOCUMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_document).collect())
    }

    async fn delete_document(&self, id: &str) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM documents WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Ok(None);
        }

        sqlx::query("DELETE FROM chunk_vectors WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(removed as i64))
    }

    async fn search(
        &self,
        query_vec: &[f32],
        k: usize,
        source: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT cv.chunk_id, cv.document_id, cv.embedding,
                   c.page, c.chunk_index, c.text, d.filename
            FROM chunk_vectors cv
            JOIN chunks c ON c.id = cv.chunk_id
            JOIN documents d ON d.id = cv.document_id
            WHERE cv.dims = ? AND (? IS NULL OR d.filename = ?)
            "#,
        )
        .bind(query_vec.len() as i64)
        .bind(source)
        .bind(source)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                ScoredChunk {
                    chunk_id: row.get("chunk_id"),
                    document_id: row.get("document_id"),
                    filename: row.get("filename"),
                    page: row.get("page"),
                    chunk_index: row.get("chunk_index"),
                    text: row.get("text"),
                    score: cosine_similarity(query_vec, &vec),
                }
            })
            .collect();

        rank(&mut candidates, k);
        Ok(candidates)
    }

    async fn stats(&self) -> Result<CollectionStats> {
        let total_documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        let total_queries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queries")
            .fetch_one(&self.pool)
            .await?;
        let avg_latency_ms: Option<f64> = sqlx::query_scalar("SELECT AVG(latency_ms) FROM queries")
            .fetch_one(&self.pool)
            .await?;

        Ok(CollectionStats {
            total_documents,
            total_chunks,
            total_queries,
            avg_latency_ms,
        })
    }

    async fn reset(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in ["chunk_vectors", "chunks", "documents", "queries"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn append_query(&self, record: &QueryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queries (id, question, answer, retrieved_chunk_ids, sources_json,
                                 latency_ms, created_at, status, error)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.question)
        .bind(&record.answer)
        .bind(serde_json::to_string(&record.retrieved_chunk_ids)?)
        .bind(serde_json::to_string(&record.sources)?)
        .bind(record.latency_ms)
        .bind(record.created_at)
        .bind(record.status.as_str())
        .bind(&record.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_queries(&self, limit: Option<usize>) -> Result<Vec<QueryRecord>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = sqlx::query(
            "SELECT * FROM queries ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_query).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::{db, migrate};

    async fn open(dir: &std::path::Path) -> SqliteStore {
        let mut config = Config::default();
        config.store.persist_directory = dir.to_path_buf();
        let pool = db::connect(&config).await.unwrap();
        migrate::apply(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn doc(id: &str, filename: &str, uploaded_at: i64) -> Document {
        Document {
            id: id.to_string(),
            filename: filename.to_string(),
            source_path: format!("/tmp/{}", filename),
            content_hash: format!("hash-{}", id),
            page_count: 2,
            chunk_count: 0,
            uploaded_at,
        }
    }

    fn chunk(doc_id: &str, index: i64) -> Chunk {
        Chunk {
            id: format!("{}-{}", doc_id, index),
            document_id: doc_id.to_string(),
            page: index + 1,
            chunk_index: index,
            page_chunk: 0,
            text: format!("text {} of {}", index, doc_id),
            hash: format!("h{}", index),
        }
    }

    async fn seed(store: &SqliteStore) {
        store
            .insert_document(
                &doc("a", "a.pdf", 10),
                &[chunk("a", 0), chunk("a", 1)],
                &[vec![1.0, 0.0], vec![0.6, 0.8]],
                "test",
            )
            .await
            .unwrap();
        store
            .insert_document(&doc("b", "b.pdf", 20), &[chunk("b", 0)], &[vec![0.0, 1.0]], "test")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_list_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        seed(&store).await;

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "b");
        assert_eq!(docs[1].chunk_count, 2);

        let a = store.get_document("a").await.unwrap().unwrap();
        assert_eq!(a.filename, "a.pdf");
        assert!(store.get_document("zzz").await.unwrap().is_none());
        assert_eq!(
            store.find_by_hash("hash-b").await.unwrap().map(|d| d.id),
            Some("b".to_string())
        );
    }

    #[tokio::test]
    async fn test_search_ranks_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        seed(&store).await;

        let hits = store.search(&[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "a-0");
        assert_eq!(hits[1].chunk_id, "a-1");
        assert_eq!(hits[1].page, 2);
        assert!((hits[1].score - 0.6).abs() < 1e-5);

        let hits = store.search(&[1.0, 0.0], 4, Some("b.pdf")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "b.pdf");

        let hits = store.search(&[1.0, 0.0, 0.0], 4, None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        seed(&store).await;

        assert_eq!(store.delete_document("a").await.unwrap(), Some(2));
        assert_eq!(store.delete_document("a").await.unwrap(), None);

        let hits = store.search(&[1.0, 0.0], 10, None).await.unwrap();
        assert!(hits.iter().all(|h| h.document_id == "b"));
        let vectors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(vectors, 1);
    }

    #[tokio::test]
    async fn test_duplicate_hash_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        seed(&store).await;

        let mut dup = doc("c", "c.pdf", 30);
        dup.content_hash = "hash-a".to_string();
        let res = store
            .insert_document(&dup, &[chunk("c", 0)], &[vec![1.0, 0.0]], "test")
            .await;
        assert!(res.is_err());
        assert_eq!(store.stats().await.unwrap().total_chunks, 3);
    }

    #[tokio::test]
    async fn test_query_history_roundtrip_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path()).await;
        seed(&store).await;

        let record = QueryRecord {
            id: "q1".to_string(),
            question: "What?".to_string(),
            answer: Some("This.".to_string()),
            retrieved_chunk_ids: vec!["a-0".to_string(), "b-0".to_string()],
            sources: vec![Citation {
                document_id: "a".to_string(),
                source: "a.pdf".to_string(),
                page: 1,
                chunk_id: "a-0".to_string(),
                score: 0.5,
                content_preview: "text".to_string(),
            }],
            latency_ms: 120,
            created_at: 100,
            status: QueryStatus::Success,
            error: None,
        };
        store.append_query(&record).await.unwrap();
        let mut failed = record.clone();
        failed.id = "q2".to_string();
        failed.created_at = 200;
        failed.latency_ms = 80;
        failed.status = QueryStatus::Error;
        failed.answer = None;
        failed.error = Some("boom".to_string());
        store.append_query(&failed).await.unwrap();

        let history = store.list_queries(None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, "q2");
        assert_eq!(history[1], record);
        assert_eq!(store.list_queries(Some(1)).await.unwrap().len(), 1);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_queries, 2);
        assert_eq!(stats.avg_latency_ms, Some(100.0));

        store.reset().await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.total_chunks, 0);
        assert_eq!(stats.total_queries, 0);
        assert_eq!(stats.avg_latency_ms, None);
    }
}
