//! Turn orchestration for Colloquy.
//!
//! A session owns one [`Conversation`] and runs turns against a provider:
//! stage the user input, fetch reference material, assemble the bounded
//! context, stream the reply, execute any tool calls, then commit the whole
//! exchange atomically.
//!
//! [`Conversation`]: colloquy_core::message::Conversation

pub mod reply_stream;
pub mod turn;

pub use reply_stream::{drain, StreamOutcome};
pub use turn::{RetrievalBinding, TurnReport, TurnRunner};
