//! SQLite-backed vector store.
//!
//! Metadata lives in columns, embeddings as little-endian f32 blobs, and
//! search is brute-force cosine over the tenant's rows. The primary key on
//! the deterministic record id makes `INSERT OR REPLACE` a true upsert.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{record_id, ChunkMetadata, SearchHit, VectorStore};
use crate::core::errors::ApiError;
use crate::ingest::Chunk;

pub struct SqliteVectorStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteVectorStore {
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS embedding_records (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                filename TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                start_offset INTEGER NOT NULL,
                end_offset INTEGER NOT NULL,
                file_type TEXT NOT NULL DEFAULT '',
                source_char_count INTEGER NOT NULL DEFAULT 0,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_tenant
             ON embedding_records(tenant_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_tenant_file
             ON embedding_records(tenant_id, filename)",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_hit(row: &sqlx::sqlite::SqliteRow, distance: Option<f32>) -> SearchHit {
        SearchHit {
            id: row.get("id"),
            text: row.get("content"),
            metadata: ChunkMetadata {
                filename: row.get("filename"),
                chunk_index: row.get::<i64, _>("chunk_index") as usize,
                start_offset: row.get::<i64, _>("start_offset") as usize,
                end_offset: row.get::<i64, _>("end_offset") as usize,
                file_type: row.get("file_type"),
                source_char_count: row.get::<i64, _>("source_char_count") as usize,
            },
            distance,
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn store(
        &self,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        tenant_id: &str,
    ) -> Result<usize, ApiError> {
        if chunks.len() != vectors.len() {
            return Err(ApiError::BadRequest(format!(
                "chunks and vectors count mismatch: {} vs {}",
                chunks.len(),
                vectors.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            let id = record_id(tenant_id, &chunk.filename, chunk.chunk_index);
            let blob = Self::serialize_embedding(vector);

            sqlx::query(
                "INSERT OR REPLACE INTO embedding_records
                 (id, tenant_id, filename, chunk_index, start_offset, end_offset,
                  file_type, source_char_count, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .bind(&id)
            .bind(tenant_id)
            .bind(&chunk.filename)
            .bind(chunk.chunk_index as i64)
            .bind(chunk.start_offset as i64)
            .bind(chunk.end_offset as i64)
            .bind(&chunk.file_type)
            .bind(chunk.source_char_count as i64)
            .bind(&chunk.text)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(chunks.len())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        tenant_id: &str,
        filename: Option<&str>,
    ) -> Result<Vec<SearchHit>, ApiError> {
        let rows = if let Some(filename) = filename {
            sqlx::query(
                "SELECT id, tenant_id, filename, chunk_index, start_offset, end_offset,
                        file_type, source_char_count, content, embedding
                 FROM embedding_records
                 WHERE tenant_id = ?1 AND filename = ?2",
            )
            .bind(tenant_id)
            .bind(filename)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        } else {
            sqlx::query(
                "SELECT id, tenant_id, filename, chunk_index, start_offset, end_offset,
                        file_type, source_char_count, content, embedding
                 FROM embedding_records
                 WHERE tenant_id = ?1",
            )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        };

        let mut hits: Vec<SearchHit> = rows
            .iter()
            .map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let distance = 1.0 - Self::cosine_similarity(query_vector, &stored);
                Self::row_to_hit(row, Some(distance))
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        Ok(hits)
    }

    async fn delete(&self, tenant_id: &str, filename: Option<&str>) -> Result<usize, ApiError> {
        // Resolve matching ids first, then delete by id; filtered deletes
        // are not uniformly supported across vector store backends.
        let ids: Vec<String> = if let Some(filename) = filename {
            sqlx::query_scalar(
                "SELECT id FROM embedding_records WHERE tenant_id = ?1 AND filename = ?2",
            )
            .bind(tenant_id)
            .bind(filename)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        } else {
            sqlx::query_scalar("SELECT id FROM embedding_records WHERE tenant_id = ?1")
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await
                .map_err(ApiError::internal)?
        };

        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;
        for id in &ids {
            sqlx::query("DELETE FROM embedding_records WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(ApiError::internal)?;
        }
        tx.commit().await.map_err(ApiError::internal)?;

        Ok(ids.len())
    }

    async fn count(&self, tenant_id: Option<&str>) -> Result<usize, ApiError> {
        let count: i64 = if let Some(tenant_id) = tenant_id {
            sqlx::query_scalar("SELECT COUNT(*) FROM embedding_records WHERE tenant_id = ?1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM embedding_records")
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?
        };

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteVectorStore {
        let path = std::env::temp_dir().join(format!("docint-store-{}.db", uuid::Uuid::new_v4()));
        SqliteVectorStore::open(path).await.unwrap()
    }

    fn make_chunk(tenant: &str, filename: &str, index: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            chunk_index: index,
            start_offset: index * 800,
            end_offset: index * 800 + text.chars().count(),
            filename: filename.to_string(),
            tenant_id: tenant.to_string(),
            file_type: ".txt".to_string(),
            source_char_count: 5000,
        }
    }

    #[tokio::test]
    async fn store_and_search_round_trip() {
        let store = test_store().await;

        let chunks = vec![
            make_chunk("acme", "contract.txt", 0, "termination clause"),
            make_chunk("acme", "contract.txt", 1, "payment schedule"),
        ];
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];

        let written = store.store(&chunks, &vectors, "acme").await.unwrap();
        assert_eq!(written, 2);

        let hits = store.search(&[1.0, 0.0, 0.0], 10, "acme", None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "termination clause");
        assert!(hits[0].distance.unwrap() < hits[1].distance.unwrap());
        assert!(hits[0].relevance_score().unwrap() > 0.99);
        assert_eq!(hits[0].metadata.chunk_index, 0);
        assert_eq!(hits[0].metadata.start_offset, 0);
    }

    #[tokio::test]
    async fn count_mismatch_is_rejected() {
        let store = test_store().await;
        let chunks = vec![make_chunk("acme", "a.txt", 0, "text")];

        let err = store.store(&chunks, &[], "acme").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(store.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn repeat_write_overwrites_instead_of_duplicating() {
        let store = test_store().await;

        let chunks = vec![make_chunk("acme", "a.txt", 0, "first version")];
        store.store(&chunks, &[vec![1.0, 0.0]], "acme").await.unwrap();

        let chunks = vec![make_chunk("acme", "a.txt", 0, "second version")];
        store.store(&chunks, &[vec![0.0, 1.0]], "acme").await.unwrap();

        assert_eq!(store.count(Some("acme")).await.unwrap(), 1);
        let hits = store.search(&[0.0, 1.0], 10, "acme", None).await.unwrap();
        assert_eq!(hits[0].text, "second version");
    }

    #[tokio::test]
    async fn search_never_crosses_tenants() {
        let store = test_store().await;

        store
            .store(
                &[make_chunk("acme", "a.txt", 0, "acme data")],
                &[vec![1.0, 0.0]],
                "acme",
            )
            .await
            .unwrap();
        store
            .store(
                &[make_chunk("globex", "b.txt", 0, "globex data")],
                &[vec![1.0, 0.0]],
                "globex",
            )
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10, "acme", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "acme data");

        let hits = store.search(&[1.0, 0.0], 10, "nobody", None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_respects_top_k_and_filename_filter() {
        let store = test_store().await;

        let chunks = vec![
            make_chunk("acme", "a.txt", 0, "alpha"),
            make_chunk("acme", "a.txt", 1, "beta"),
            make_chunk("acme", "b.txt", 0, "gamma"),
        ];
        let vectors = vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.8, 0.2]];
        store.store(&chunks, &vectors, "acme").await.unwrap();

        let hits = store.search(&[1.0, 0.0], 2, "acme", None).await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store
            .search(&[1.0, 0.0], 10, "acme", Some("b.txt"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "gamma");
    }

    #[tokio::test]
    async fn delete_scopes_to_tenant_and_filename() {
        let store = test_store().await;

        let chunks = vec![
            make_chunk("acme", "a.txt", 0, "one"),
            make_chunk("acme", "b.txt", 0, "two"),
        ];
        store
            .store(&chunks, &[vec![1.0], vec![1.0]], "acme")
            .await
            .unwrap();
        store
            .store(&[make_chunk("globex", "a.txt", 0, "three")], &[vec![1.0]], "globex")
            .await
            .unwrap();

        let deleted = store.delete("acme", Some("a.txt")).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count(Some("acme")).await.unwrap(), 1);

        let deleted = store.delete("acme", None).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count(Some("acme")).await.unwrap(), 0);
        assert_eq!(store.count(Some("globex")).await.unwrap(), 1);

        let deleted = store.delete("acme", Some("missing.txt")).await.unwrap();
        assert_eq!(deleted, 0);
    }
}
