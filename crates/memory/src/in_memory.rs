//! In-memory similarity index, useful for testing and ephemeral sessions.

use crate::vector::cosine_similarity;
use async_trait::async_trait;
use colloquy_core::error::IndexError;
use colloquy_core::index::{RetrievalHit, SimilarityIndex};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct IndexedDocument {
    id: String,
    text: String,
    embedding: Vec<f32>,
}

/// A similarity index backed by a Vec of documents with brute-force cosine
/// scoring. Fine for the corpus sizes a single session ingests.
pub struct InMemoryIndex {
    documents: Arc<RwLock<Vec<IndexedDocument>>>,
    dimension: Option<usize>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
            dimension: None,
        }
    }

    /// Create an index that rejects embeddings of the wrong dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
            dimension: Some(dimension),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimilarityIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn add(&self, document: &str, id: &str, embedding: Vec<f32>) -> Result<(), IndexError> {
        if let Some(expected) = self.dimension {
            if embedding.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        debug!(id, chars = document.len(), "Indexed document");
        self.documents.write().await.push(IndexedDocument {
            id: id.to_string(),
            text: document.to_string(),
            embedding,
        });
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalHit>, IndexError> {
        let documents = self.documents.read().await;

        let mut scored: Vec<(f32, &IndexedDocument)> = documents
            .iter()
            .map(|doc| (cosine_similarity(&doc.embedding, embedding), doc))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, doc))| RetrievalHit {
                source_id: doc.id.clone(),
                document: doc.text.clone(),
                rank: i + 1,
                score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.documents.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_count() {
        let index = InMemoryIndex::new();
        assert_eq!(index.count().await.unwrap(), 0);
        index
            .add("Ownership rules govern memory.", "doc-1", vec![1.0, 0.0])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn query_ranks_by_similarity() {
        let index = InMemoryIndex::new();
        index.add("orthogonal", "a", vec![0.0, 1.0]).await.unwrap();
        index.add("identical", "b", vec![1.0, 0.0]).await.unwrap();
        index.add("partial", "c", vec![0.5, 0.5]).await.unwrap();

        let hits = index.query(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].source_id, "b");
        assert_eq!(hits[1].source_id, "c");
        assert_eq!(hits[2].source_id, "a");
    }

    #[tokio::test]
    async fn ranks_are_one_based_and_sequential() {
        let index = InMemoryIndex::new();
        for i in 0..5 {
            index
                .add("text", &format!("doc-{i}"), vec![1.0, i as f32 * 0.1])
                .await
                .unwrap();
        }
        let hits = index.query(&[1.0, 0.0], 3).await.unwrap();
        let ranks: Vec<usize> = hits.iter().map(|h| h.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn query_respects_k() {
        let index = InMemoryIndex::new();
        for i in 0..10 {
            index
                .add("text", &format!("doc-{i}"), vec![1.0, i as f32])
                .await
                .unwrap();
        }
        let hits = index.query(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn query_on_empty_index_is_empty() {
        let index = InMemoryIndex::new();
        let hits = index.query(&[1.0, 0.0], 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_rejected() {
        let index = InMemoryIndex::with_dimension(3);
        let err = index
            .add("text", "doc-1", vec![1.0, 0.0])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn hit_carries_document_text() {
        let index = InMemoryIndex::new();
        index
            .add("Borrowing lets code read without owning.", "doc-1", vec![1.0])
            .await
            .unwrap();
        let hits = index.query(&[1.0], 1).await.unwrap();
        assert_eq!(hits[0].document, "Borrowing lets code read without owning.");
    }
}
