//! Vector store abstraction.
//!
//! Persists `(id, vector, text, metadata, tenant_id)` records and performs
//! tenant-filtered nearest-neighbor search. Every operation is scoped by a
//! tenant tag; there is no cross-tenant visibility.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::errors::ApiError;
use crate::ingest::Chunk;

/// Metadata persisted alongside each embedded chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub chunk_index: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub file_type: String,
    pub source_char_count: usize,
}

/// One result of a similarity search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance; `None` when the backend cannot provide one.
    pub distance: Option<f32>,
}

impl SearchHit {
    /// `1 - distance`, or `None` when the distance is undefined.
    pub fn relevance_score(&self) -> Option<f32> {
        self.distance.map(|d| 1.0 - d)
    }
}

/// How a deletion request ended. Failure is non-fatal and reported, never
/// raised, so callers can tell "nothing matched" apart from "store broke".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionOutcome {
    Deleted,
    NothingMatched,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    pub chunks_deleted: usize,
    pub outcome: DeletionOutcome,
}

impl DeletionReport {
    pub fn from_result(result: Result<usize, ApiError>) -> Self {
        match result {
            Ok(0) => Self {
                chunks_deleted: 0,
                outcome: DeletionOutcome::NothingMatched,
            },
            Ok(count) => Self {
                chunks_deleted: count,
                outcome: DeletionOutcome::Deleted,
            },
            Err(err) => {
                tracing::warn!("Vector store deletion failed: {}", err);
                Self {
                    chunks_deleted: 0,
                    outcome: DeletionOutcome::Failed,
                }
            }
        }
    }
}

/// Deterministic record id for `(tenant_id, filename, chunk_index)`.
///
/// Length-prefixing keeps field boundaries unambiguous, so no combination
/// of delimiter-looking tenant or file names can collide. Re-uploading the
/// same document chunk under the same tenant always produces the same id.
pub fn record_id(tenant_id: &str, filename: &str, chunk_index: usize) -> String {
    let mut hasher = Sha256::new();
    for part in [tenant_id.as_bytes(), filename.as_bytes()] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.update((chunk_index as u64).to_le_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist chunks with their vectors under `tenant_id`. Writes are keyed
    /// by [`record_id`]; a repeat write with the same id replaces the prior
    /// record. Errors when the chunk and vector counts differ.
    async fn store(
        &self,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        tenant_id: &str,
    ) -> Result<usize, ApiError>;

    /// At most `top_k` records for the tenant (optionally scoped to one
    /// filename), ascending cosine distance. Empty when nothing matches.
    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        tenant_id: &str,
        filename: Option<&str>,
    ) -> Result<Vec<SearchHit>, ApiError>;

    /// Delete the tenant's records, optionally scoped to one filename.
    /// Resolves matching ids first, then deletes by id. Zero matches is
    /// `Ok(0)`, not an error.
    async fn delete(&self, tenant_id: &str, filename: Option<&str>) -> Result<usize, ApiError>;

    /// Record count, optionally scoped to a tenant.
    async fn count(&self, tenant_id: Option<&str>) -> Result<usize, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_deterministic() {
        assert_eq!(record_id("acme", "a.txt", 0), record_id("acme", "a.txt", 0));
    }

    #[test]
    fn record_id_distinguishes_every_field() {
        let base = record_id("acme", "a.txt", 0);
        assert_ne!(base, record_id("other", "a.txt", 0));
        assert_ne!(base, record_id("acme", "b.txt", 0));
        assert_ne!(base, record_id("acme", "a.txt", 1));
    }

    #[test]
    fn record_id_resists_delimiter_ambiguity() {
        // A naive "tenant_filename_index" join would collide here.
        assert_ne!(record_id("a_b", "c.txt", 0), record_id("a", "b_c.txt", 0));
    }

    #[test]
    fn relevance_score_propagates_missing_distance() {
        let hit = SearchHit {
            id: "x".to_string(),
            text: String::new(),
            metadata: ChunkMetadata {
                filename: "f".to_string(),
                chunk_index: 0,
                start_offset: 0,
                end_offset: 0,
                file_type: ".txt".to_string(),
                source_char_count: 0,
            },
            distance: None,
        };
        assert_eq!(hit.relevance_score(), None);
    }

    #[test]
    fn deletion_report_distinguishes_outcomes() {
        let deleted = DeletionReport::from_result(Ok(3));
        assert_eq!(deleted.outcome, DeletionOutcome::Deleted);
        assert_eq!(deleted.chunks_deleted, 3);

        let empty = DeletionReport::from_result(Ok(0));
        assert_eq!(empty.outcome, DeletionOutcome::NothingMatched);

        let failed =
            DeletionReport::from_result(Err(ApiError::Internal("store offline".to_string())));
        assert_eq!(failed.outcome, DeletionOutcome::Failed);
        assert_eq!(failed.chunks_deleted, 0);
    }
}
