//! History trimming under a hard token budget.
//!
//! The trimmer selects the suffix of conversation history that fits the
//! budget. Selection is newest-first greedy: scanning stops at the first
//! message that does not fit, so the result is always a contiguous suffix,
//! never a disjoint subset. Messages are returned in original chronological
//! order.
//!
//! The pinned prefix is a fixed floor inside the budget: the running cost is
//! seeded with the prefix cost, and when the prefix alone meets or exceeds
//! the budget no history is selected. That is graceful degradation, not an
//! error; the prefix is sent alone.

use crate::token::Encoding;
use colloquy_core::message::Message;
use tracing::debug;

/// The result of a trim pass.
#[derive(Debug, Clone)]
pub struct TrimOutcome {
    /// Selected messages, in original chronological order.
    pub messages: Vec<Message>,
    /// Token cost of the selected messages (excludes the pinned floor).
    pub history_tokens: usize,
    /// Number of candidate messages that did not make the cut.
    pub dropped: usize,
}

/// Select the newest contiguous suffix of `history` that fits `budget`.
///
/// `history` must exclude the pinned prefix and the initial greeting;
/// `pinned_tokens` is their precomputed cost. A message is never partially
/// truncated: if its whole cost does not fit, it and everything older are
/// excluded.
pub fn trim(
    history: &[Message],
    budget: usize,
    pinned_tokens: usize,
    encoding: Encoding,
) -> TrimOutcome {
    let mut selected: Vec<Message> = Vec::new();
    let mut running = pinned_tokens;

    for (scanned, message) in history.iter().rev().enumerate() {
        let cost = encoding.message_tokens(message);
        if running + cost <= budget {
            selected.push(message.clone());
            running += cost;
        } else {
            // Stop at the first miss: skipping over it to test older
            // messages would break the contiguous-suffix guarantee.
            let dropped = history.len() - scanned;
            debug!(
                kept = selected.len(),
                dropped,
                history_tokens = running - pinned_tokens,
                budget,
                "Trimmed conversation history"
            );
            selected.reverse();
            return TrimOutcome {
                messages: selected,
                history_tokens: running - pinned_tokens,
                dropped,
            };
        }
    }

    selected.reverse();
    TrimOutcome {
        messages: selected,
        history_tokens: running - pinned_tokens,
        dropped: 0,
    }
}
