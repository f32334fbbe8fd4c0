//! Token counting for context assembly.
//!
//! Counting must be pure and deterministic for a given encoding: the trimmer
//! and assembler re-derive the same numbers every turn. Each model family
//! maps to a named encoding; unknown models resolve to the default encoding
//! instead of failing, and the resolution is an explicit two-variant value
//! rather than a caught error.
//!
//! The encodings here use a character heuristic (~4 characters per token),
//! accurate within ~10% for BPE tokenizers on English text. What matters for
//! the budget invariants is determinism, not exactness.

use colloquy_core::message::Message;

/// Fixed per-message overhead for role name, delimiters, and formatting
/// markers in the API wire format.
pub const MESSAGE_OVERHEAD: usize = 4;

/// Fixed cost added once per batch to prime the model's reply.
pub const REPLY_PRIMING: usize = 2;

/// A named token encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
    /// Encoding name (e.g., "cl100k_base").
    pub name: &'static str,
    chars_per_token: usize,
}

/// Default general-purpose encoding, used when a model is unrecognized.
pub const CL100K_BASE: Encoding = Encoding {
    name: "cl100k_base",
    chars_per_token: 4,
};

/// Encoding for the gpt-4o / gpt-4.1 / o-series model families.
pub const O200K_BASE: Encoding = Encoding {
    name: "o200k_base",
    chars_per_token: 4,
};

/// How an encoding was resolved for a model name.
///
/// `Fallback` is not an error: it records that no encoding is registered for
/// the model and the default encoding is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingLookup {
    /// A registered encoding matched the model name.
    Exact(Encoding),
    /// No encoding registered for the model; the default applies.
    Fallback(Encoding),
}

impl EncodingLookup {
    /// The encoding to use, regardless of how it was resolved.
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Exact(e) | Self::Fallback(e) => *e,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Resolve the encoding for a model name.
///
/// Registered families are matched by prefix; anything else falls back to
/// [`CL100K_BASE`].
pub fn encoding_for_model(model: &str) -> EncodingLookup {
    const O200K_FAMILIES: &[&str] = &["gpt-4o", "gpt-4.1", "o1", "o3", "o4"];
    const CL100K_FAMILIES: &[&str] = &["gpt-4", "gpt-3.5-turbo", "text-embedding"];

    if O200K_FAMILIES.iter().any(|p| model.starts_with(p)) {
        return EncodingLookup::Exact(O200K_BASE);
    }
    if CL100K_FAMILIES.iter().any(|p| model.starts_with(p)) {
        return EncodingLookup::Exact(CL100K_BASE);
    }
    EncodingLookup::Fallback(CL100K_BASE)
}

impl Encoding {
    /// Token length of a text fragment. Rounds up; empty text is zero.
    pub fn text_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        text.len().div_ceil(self.chars_per_token)
    }

    /// Token cost of a single message: per-message overhead plus the token
    /// length of every text field (role label, content, tool call payloads,
    /// tool call id). Excludes reply priming; that is charged once per
    /// batch in [`Encoding::count_tokens`].
    pub fn message_tokens(&self, message: &Message) -> usize {
        let mut tokens = MESSAGE_OVERHEAD;
        tokens += self.text_tokens(message.role.label());
        tokens += self.text_tokens(&message.content);
        for call in &message.tool_calls {
            tokens += self.text_tokens(&call.name);
            tokens += self.text_tokens(&call.arguments);
        }
        if let Some(id) = &message.tool_call_id {
            tokens += self.text_tokens(id);
        }
        tokens
    }

    /// Token cost of a whole batch, reply priming included.
    pub fn count_tokens(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.message_tokens(m)).sum::<usize>() + REPLY_PRIMING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(CL100K_BASE.text_tokens(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(CL100K_BASE.text_tokens("test"), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(CL100K_BASE.text_tokens("hello"), 2);
    }

    #[test]
    fn message_includes_overhead_and_role() {
        // content "test" = 1 token, role "user" = 1 token, overhead 4
        let msg = Message::user("test");
        assert_eq!(CL100K_BASE.message_tokens(&msg), 6);
    }

    #[test]
    fn tool_result_counts_call_id() {
        let msg = Message::tool_result("call_abcd", "ok");
        let without_id = {
            let mut m = msg.clone();
            m.tool_call_id = None;
            CL100K_BASE.message_tokens(&m)
        };
        assert_eq!(
            CL100K_BASE.message_tokens(&msg),
            without_id + CL100K_BASE.text_tokens("call_abcd")
        );
    }

    #[test]
    fn batch_adds_priming_once() {
        let msgs = vec![Message::user("hello"), Message::assistant("world")];
        let per_message: usize = msgs.iter().map(|m| CL100K_BASE.message_tokens(m)).sum();
        assert_eq!(CL100K_BASE.count_tokens(&msgs), per_message + REPLY_PRIMING);
    }

    #[test]
    fn empty_batch_is_priming_only() {
        assert_eq!(CL100K_BASE.count_tokens(&[]), REPLY_PRIMING);
    }

    #[test]
    fn known_models_resolve_exactly() {
        let lookup = encoding_for_model("gpt-4o-mini");
        assert!(!lookup.is_fallback());
        assert_eq!(lookup.encoding().name, "o200k_base");

        let lookup = encoding_for_model("gpt-3.5-turbo");
        assert!(!lookup.is_fallback());
        assert_eq!(lookup.encoding().name, "cl100k_base");
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        let lookup = encoding_for_model("some-local-model");
        assert!(lookup.is_fallback());
        assert_eq!(lookup.encoding(), CL100K_BASE);
    }

    #[test]
    fn counting_is_deterministic() {
        let msgs = vec![
            Message::user("the quick brown fox"),
            Message::assistant("jumps over the lazy dog"),
        ];
        let enc = encoding_for_model("gpt-4o").encoding();
        assert_eq!(enc.count_tokens(&msgs), enc.count_tokens(&msgs));
    }
}
