//! Pinned prefix construction.
//!
//! The pinned prefix is the pair of messages that opens every assembled
//! context: the system instructions (optionally extended with reference
//! material) followed by the fixed initial greeting. It is rebuilt from
//! scratch every turn, never partially mutated, and is exempt from
//! history trimming.

use crate::token::Encoding;
use colloquy_core::message::{Message, Role};

/// Delimiter line that opens the reference-material section of the system
/// message, so the model can attribute sourced claims.
pub const REFERENCE_HEADER: &str = "--- Reference material ---";

/// The always-included head of an assembled context.
///
/// Exactly two messages: a system message followed by the greeting.
#[derive(Debug, Clone)]
pub struct PinnedPrefix {
    messages: Vec<Message>,
}

impl PinnedPrefix {
    /// The pinned messages, in the order they open the context.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The system message (always first).
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    /// Token cost of the prefix, reply priming included.
    pub fn tokens(&self, encoding: Encoding) -> usize {
        encoding.count_tokens(&self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Build the pinned prefix for a turn.
///
/// If `reference_text` is present it is appended to the base instructions
/// under a delimited section. Safe to call every turn; no side effects.
pub fn build_prefix(
    base_instructions: &str,
    reference_text: Option<&str>,
    greeting: &Message,
) -> PinnedPrefix {
    let system_content = match reference_text {
        Some(reference) if !reference.trim().is_empty() => {
            format!(
                "{base_instructions}\n\n{REFERENCE_HEADER}\n\
                 Use the following material to answer the user's questions when \
                 relevant, and attribute sourced claims to it:\n\n{reference}"
            )
        }
        _ => base_instructions.to_string(),
    };

    PinnedPrefix {
        messages: vec![Message::system(system_content), greeting.clone()],
    }
}
