//! SimilarityIndex trait, the abstraction over the external vector store.
//!
//! The core only issues reads (query) and occasional writes (document adds)
//! against the index; the index provides its own consistency for concurrent
//! readers, and the core does not coordinate concurrent writers. Persistence
//! format belongs to the backing store.

use crate::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single result from a similarity query.
///
/// Produced fresh for every query; never persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Identifier of the source document.
    pub source_id: String,

    /// The document text.
    pub document: String,

    /// Similarity rank, 1-based (rank 1 = most similar).
    pub rank: usize,

    /// Cosine similarity score from the search.
    #[serde(default)]
    pub score: f32,
}

/// The similarity index trait.
///
/// Implementations: in-memory (colloquy-memory), or any external vector
/// store wrapped behind this interface.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Add a document with its precomputed embedding.
    async fn add(
        &self,
        document: &str,
        id: &str,
        embedding: Vec<f32>,
    ) -> std::result::Result<(), IndexError>;

    /// Return up to `k` hits ordered by descending similarity to `embedding`.
    async fn query(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> std::result::Result<Vec<RetrievalHit>, IndexError>;

    /// Total number of indexed documents.
    async fn count(&self) -> std::result::Result<usize, IndexError>;
}
