//! Similarity index backends for Colloquy.
//!
//! The retrieval augmenter talks to a [`SimilarityIndex`]; this crate
//! provides the in-memory implementation plus the vector math behind it.

pub mod in_memory;
pub mod vector;

pub use colloquy_core::index::{RetrievalHit, SimilarityIndex};
pub use in_memory::InMemoryIndex;
pub use vector::cosine_similarity;
