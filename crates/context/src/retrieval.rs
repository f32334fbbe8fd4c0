//! Retrieval augmentation.
//!
//! Given the current user query, fetch the top-K most similar documents from
//! the external similarity index and render them as a reference block for
//! the system instructions. Retrieval is strictly best-effort: an empty
//! index, a failed embedding call, or a failed query all degrade to "no
//! augmentation" with a warning log. A turn is never aborted by retrieval.

use colloquy_core::index::{RetrievalHit, SimilarityIndex};
use colloquy_core::provider::{EmbeddingRequest, Provider};
use tracing::{debug, warn};

/// Settings for retrieval augmentation.
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    /// Maximum number of hits to inject.
    pub top_k: usize,
    /// Per-document truncation limit, in characters.
    pub snippet_limit: usize,
    /// Embedding model used for the query.
    pub embedding_model: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            snippet_limit: 3000,
            embedding_model: "text-embedding-3-small".into(),
        }
    }
}

/// Fetch and render reference material for `query`.
///
/// Returns `None` when there is nothing to inject: empty index, embedding
/// failure, query failure, or no hits.
pub async fn augment(
    query: &str,
    index: &dyn SimilarityIndex,
    embedder: &dyn Provider,
    settings: &RetrievalSettings,
) -> Option<String> {
    match index.count().await {
        Ok(0) => {
            debug!(index = index.name(), "Similarity index is empty, skipping augmentation");
            return None;
        }
        Ok(_) => {}
        Err(e) => {
            warn!(index = index.name(), error = %e, "Index count failed, skipping augmentation");
            return None;
        }
    }

    let embedding = match embedder
        .embed(EmbeddingRequest {
            model: settings.embedding_model.clone(),
            inputs: vec![query.to_string()],
        })
        .await
    {
        Ok(response) => match response.embeddings.into_iter().next() {
            Some(v) => v,
            None => {
                warn!("Embedding response was empty, skipping augmentation");
                return None;
            }
        },
        Err(e) => {
            warn!(error = %e, "Query embedding failed, skipping augmentation");
            return None;
        }
    };

    let hits = match index.query(&embedding, settings.top_k).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!(index = index.name(), error = %e, "Similarity query failed, skipping augmentation");
            return None;
        }
    };

    if hits.is_empty() {
        debug!("Similarity query returned no hits");
        return None;
    }

    debug!(hits = hits.len(), "Rendering retrieval block");
    Some(render_hits(&hits, settings.snippet_limit))
}

/// Render hits into the reference block injected into the system message.
///
/// One "Retrieved from" section per hit, in similarity-rank order, each
/// document truncated to `snippet_limit` characters.
pub fn render_hits(hits: &[RetrievalHit], snippet_limit: usize) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "Retrieved from {} (rank {}):\n{}",
                hit.source_id,
                hit.rank,
                truncate_chars(&hit.document, snippet_limit)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Truncate to at most `limit` characters, on a character boundary.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}
