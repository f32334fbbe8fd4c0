//! Token-bounded context assembly for Colloquy.
//!
//! Every turn the session rebuilds the message list sent to the model:
//!
//! 1. **Pinned prefix**: system instructions (optionally extended with
//!    retrieved reference material) plus the fixed greeting. Always first,
//!    never trimmed.
//! 2. **History suffix**: the newest contiguous run of conversation
//!    messages whose cost fits the token budget alongside the prefix.
//!
//! Token costs come from a deterministic per-encoding heuristic; trimming
//! is newest-first greedy and never splits a message. The whole pipeline is
//! pure: the conversation itself is never mutated by assembly.

pub mod assembler;
pub mod prefix;
pub mod retrieval;
pub mod token;
pub mod trimmer;

pub use assembler::{AssembledContext, ContextAssembler, UsageStats};
pub use prefix::{build_prefix, PinnedPrefix, REFERENCE_HEADER};
pub use retrieval::{augment, render_hits, RetrievalSettings};
pub use token::{
    encoding_for_model, Encoding, EncodingLookup, CL100K_BASE, MESSAGE_OVERHEAD, O200K_BASE,
    REPLY_PRIMING,
};
pub use trimmer::{trim, TrimOutcome};
