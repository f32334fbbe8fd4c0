//! Context assembly.
//!
//! The assembler composes the final message list for a completion request:
//! the pinned prefix first, then the budget-trimmed history suffix in
//! chronological order. It is stateless and side-effect free; it never
//! mutates the conversation, and assembling the same inputs twice produces
//! the same output.

use crate::prefix::PinnedPrefix;
use crate::token::{encoding_for_model, Encoding};
use crate::trimmer::{self, TrimOutcome};
use colloquy_core::message::{Conversation, Message};
use serde::Serialize;
use tracing::debug;

/// Token accounting for one assembled context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    /// Cost of the pinned prefix, reply priming included.
    pub pinned_tokens: usize,
    /// Cost of the selected history suffix.
    pub history_tokens: usize,
    /// Total cost of the assembled context.
    pub total_tokens: usize,
    /// Number of messages in the assembled context.
    pub message_count: usize,
    /// Number of history messages excluded by trimming.
    pub dropped_messages: usize,
}

/// The product of one assembly pass.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// The final message list, ready to send to the provider.
    pub messages: Vec<Message>,
    /// Token accounting for the list.
    pub stats: UsageStats,
}

/// Stateless context assembler.
///
/// Holds only configuration (budget and encoding); every call to
/// [`ContextAssembler::assemble`] derives its output purely from the inputs.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    budget: usize,
    encoding: Encoding,
}

impl ContextAssembler {
    /// Create an assembler for `model` with the given token budget.
    ///
    /// The encoding is resolved from the model name; unknown models use the
    /// default encoding.
    pub fn new(budget: usize, model: &str) -> Self {
        let lookup = encoding_for_model(model);
        if lookup.is_fallback() {
            debug!(
                model,
                encoding = lookup.encoding().name,
                "No encoding registered for model, using default"
            );
        }
        Self {
            budget,
            encoding: lookup.encoding(),
        }
    }

    /// The encoding in effect for this assembler.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The configured token budget.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Assemble the context for one turn.
    ///
    /// The pinned prefix opens the list unmodified and in order; the trimmed
    /// history suffix follows in chronological order. The greeting inside the
    /// conversation is skipped as history because the prefix already carries
    /// it.
    pub fn assemble(&self, conversation: &Conversation, pinned: &PinnedPrefix) -> AssembledContext {
        let pinned_tokens = pinned.tokens(self.encoding);
        let TrimOutcome {
            messages: history,
            history_tokens,
            dropped,
        } = trimmer::trim(conversation.history(), self.budget, pinned_tokens, self.encoding);

        let mut messages = pinned.messages().to_vec();
        messages.extend(history);

        let stats = UsageStats {
            pinned_tokens,
            history_tokens,
            total_tokens: pinned_tokens + history_tokens,
            message_count: messages.len(),
            dropped_messages: dropped,
        };

        debug!(
            pinned_tokens = stats.pinned_tokens,
            history_tokens = stats.history_tokens,
            total_tokens = stats.total_tokens,
            messages = stats.message_count,
            dropped = stats.dropped_messages,
            budget = self.budget,
            "Assembled context"
        );

        AssembledContext { messages, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::build_prefix;
    use crate::token::{CL100K_BASE, MESSAGE_OVERHEAD};
    use colloquy_core::message::{Conversation, Role};

    /// Build a message whose cost is exactly `cost` under CL100K_BASE.
    fn message_costing(role: Role, cost: usize) -> Message {
        let role_tokens = CL100K_BASE.text_tokens(role.label());
        let content_tokens = cost - MESSAGE_OVERHEAD - role_tokens;
        let content = "x".repeat(content_tokens * 4);
        let msg = match role {
            Role::User => Message::user(content),
            Role::Assistant => Message::assistant(content),
            other => panic!("unsupported test role: {other:?}"),
        };
        assert_eq!(CL100K_BASE.message_tokens(&msg), cost);
        msg
    }

    fn conversation_with(history: Vec<Message>) -> Conversation {
        let mut conv = Conversation::with_greeting("How can I help you?");
        for msg in history {
            conv.push(msg);
        }
        conv
    }

    fn instructions_costing(prefix_cost: usize) -> String {
        // Prefix = system + greeting + priming. Solve for the system content
        // size that lands the whole prefix at `prefix_cost`.
        let greeting = Message::assistant("How can I help you?");
        let fixed = CL100K_BASE.message_tokens(&greeting)
            + MESSAGE_OVERHEAD
            + CL100K_BASE.text_tokens(Role::System.label())
            + crate::token::REPLY_PRIMING;
        "x".repeat((prefix_cost - fixed) * 4)
    }

    #[test]
    fn pinned_prefix_opens_unmodified_and_in_order() {
        let conv = conversation_with(vec![
            message_costing(Role::User, 50),
            message_costing(Role::Assistant, 50),
        ]);
        let prefix = build_prefix("You are a helpful tutor.", None, conv.greeting());
        let assembler = ContextAssembler::new(2000, "gpt-4o-mini");
        let out = assembler.assemble(&conv, &prefix);

        assert_eq!(out.messages[0].role, Role::System);
        assert_eq!(out.messages[0].content, prefix.system().content);
        assert_eq!(out.messages[1].content, conv.greeting().content);
    }

    #[test]
    fn trimming_keeps_newest_pair_under_tight_budget() {
        // Six 50-token messages, 100-token prefix, 220-token budget:
        // exactly the two newest survive.
        let history: Vec<Message> = (0..6)
            .map(|i| {
                if i % 2 == 0 {
                    message_costing(Role::User, 50)
                } else {
                    message_costing(Role::Assistant, 50)
                }
            })
            .collect();
        let conv = conversation_with(history.clone());
        let prefix = build_prefix(&instructions_costing(100), None, conv.greeting());
        assert_eq!(prefix.tokens(CL100K_BASE), 100);

        let assembler = ContextAssembler::new(220, "gpt-4");
        let out = assembler.assemble(&conv, &prefix);

        assert_eq!(out.stats.pinned_tokens, 100);
        assert_eq!(out.stats.history_tokens, 100);
        assert_eq!(out.stats.total_tokens, 200);
        assert_eq!(out.stats.dropped_messages, 4);
        assert_eq!(out.messages.len(), 4); // prefix pair + 2 history
        assert_eq!(out.messages[2].content, history[4].content);
        assert_eq!(out.messages[3].content, history[5].content);
    }

    #[test]
    fn prefix_exceeding_budget_sends_prefix_alone() {
        let conv = conversation_with(vec![message_costing(Role::User, 20)]);
        let prefix = build_prefix(&instructions_costing(100), None, conv.greeting());

        let assembler = ContextAssembler::new(50, "gpt-4");
        let out = assembler.assemble(&conv, &prefix);

        // Not an error: the prefix pair goes out with no history attached.
        assert_eq!(out.messages.len(), 2);
        assert_eq!(out.stats.history_tokens, 0);
        assert_eq!(out.stats.dropped_messages, 1);
    }

    #[test]
    fn non_pinned_cost_never_exceeds_budget() {
        for budget in [0, 40, 120, 300, 5000] {
            let history: Vec<Message> = (0..10)
                .map(|i| {
                    if i % 2 == 0 {
                        message_costing(Role::User, 30)
                    } else {
                        message_costing(Role::Assistant, 45)
                    }
                })
                .collect();
            let conv = conversation_with(history);
            let prefix = build_prefix("Short instructions.", None, conv.greeting());
            let pinned = prefix.tokens(CL100K_BASE);

            let assembler = ContextAssembler::new(budget, "gpt-4");
            let out = assembler.assemble(&conv, &prefix);
            assert!(
                pinned + out.stats.history_tokens <= budget || out.stats.history_tokens == 0,
                "budget {budget} overran"
            );
        }
    }

    #[test]
    fn chronological_order_preserved() {
        let conv = conversation_with(vec![
            Message::user("first question"),
            Message::assistant("first answer"),
            Message::user("second question"),
            Message::assistant("second answer"),
        ]);
        let prefix = build_prefix("Instructions.", None, conv.greeting());
        let assembler = ContextAssembler::new(2000, "gpt-4o");
        let out = assembler.assemble(&conv, &prefix);

        let contents: Vec<&str> = out.messages[2..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![
                "first question",
                "first answer",
                "second question",
                "second answer"
            ]
        );
    }

    #[test]
    fn assembly_is_idempotent() {
        let conv = conversation_with(vec![
            message_costing(Role::User, 40),
            message_costing(Role::Assistant, 60),
            message_costing(Role::User, 40),
        ]);
        let prefix = build_prefix("Instructions.", None, conv.greeting());
        let assembler = ContextAssembler::new(150, "gpt-4o-mini");

        let a = assembler.assemble(&conv, &prefix);
        let b = assembler.assemble(&conv, &prefix);

        assert_eq!(a.stats, b.stats);
        let a_contents: Vec<_> = a.messages.iter().map(|m| &m.content).collect();
        let b_contents: Vec<_> = b.messages.iter().map(|m| &m.content).collect();
        assert_eq!(a_contents, b_contents);
    }

    #[test]
    fn assembly_does_not_mutate_conversation() {
        let conv = conversation_with(vec![
            message_costing(Role::User, 400),
            message_costing(Role::Assistant, 400),
        ]);
        let before = conv.len();
        let prefix = build_prefix("Instructions.", None, conv.greeting());
        let assembler = ContextAssembler::new(100, "gpt-4");
        let _ = assembler.assemble(&conv, &prefix);

        assert_eq!(conv.len(), before);
        assert_eq!(conv.history().len(), 2);
    }

    #[test]
    fn no_reference_matches_plain_assembly() {
        // Assembly with an absent reference block is byte-identical to
        // assembly with no augmentation at all.
        let conv = conversation_with(vec![Message::user("hello")]);
        let with_none = build_prefix("Instructions.", None, conv.greeting());
        let plain = build_prefix("Instructions.", None, conv.greeting());
        let assembler = ContextAssembler::new(500, "gpt-4o");

        let a = assembler.assemble(&conv, &with_none);
        let b = assembler.assemble(&conv, &plain);
        assert_eq!(a.messages[0].content, b.messages[0].content);
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn reference_block_raises_pinned_cost_only() {
        let conv = conversation_with(vec![Message::user("hello")]);
        let plain = build_prefix("Instructions.", None, conv.greeting());
        let augmented = build_prefix(
            "Instructions.",
            Some("Retrieved from doc-1 (rank 1):\nOwnership moves values."),
            conv.greeting(),
        );
        let assembler = ContextAssembler::new(2000, "gpt-4o");

        let a = assembler.assemble(&conv, &plain);
        let b = assembler.assemble(&conv, &augmented);
        assert!(b.stats.pinned_tokens > a.stats.pinned_tokens);
        assert_eq!(a.stats.history_tokens, b.stats.history_tokens);
    }

    #[test]
    fn empty_conversation_assembles_prefix_only() {
        let conv = Conversation::with_greeting("How can I help you?");
        let prefix = build_prefix("Instructions.", None, conv.greeting());
        let assembler = ContextAssembler::new(2000, "gpt-4o");
        let out = assembler.assemble(&conv, &prefix);

        assert_eq!(out.messages.len(), 2);
        assert_eq!(out.stats.history_tokens, 0);
        assert_eq!(out.stats.dropped_messages, 0);
    }
}
