//! Completion service clients for Colloquy.
//!
//! The OpenAI-compatible client covers the hosted API plus anything exposing
//! the same surface. The mock client replays scripted replies for tests.

pub mod mock;
pub mod openai;

pub use mock::{MockProvider, ScriptedReply};
pub use openai::OpenAiProvider;
