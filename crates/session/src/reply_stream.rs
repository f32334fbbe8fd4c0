//! Draining a streamed reply.
//!
//! A reply stream is finite, forward-only, and non-restartable. The session
//! drains it fully before anything is committed to the conversation: a
//! stream that errors midway yields an aborted outcome and the fragments
//! already seen are discarded.

use colloquy_core::error::ProviderError;
use colloquy_core::message::MessageToolCall;
use colloquy_core::provider::{StreamChunk, Usage};
use tokio::sync::mpsc::Receiver;
use tracing::debug;

/// What a fully consumed stream produced.
#[derive(Debug)]
pub enum StreamOutcome {
    /// The stream completed; the reply is whole.
    Drained {
        content: String,
        tool_calls: Vec<MessageToolCall>,
        usage: Option<Usage>,
    },
    /// The stream failed partway; nothing may be committed.
    Aborted(ProviderError),
}

/// Consume a reply stream to the end.
///
/// `on_fragment` fires for each content delta as it arrives, so callers can
/// render incrementally. The accumulated reply is only trustworthy when the
/// outcome is [`StreamOutcome::Drained`].
pub async fn drain<F>(
    mut rx: Receiver<Result<StreamChunk, ProviderError>>,
    mut on_fragment: F,
) -> StreamOutcome
where
    F: FnMut(&str),
{
    let mut content = String::new();
    let mut tool_calls: Vec<MessageToolCall> = Vec::new();
    let mut usage: Option<Usage> = None;

    while let Some(item) = rx.recv().await {
        match item {
            Ok(chunk) => {
                if let Some(fragment) = &chunk.content {
                    if !fragment.is_empty() {
                        content.push_str(fragment);
                        on_fragment(fragment);
                    }
                }
                if !chunk.tool_calls.is_empty() {
                    tool_calls = chunk.tool_calls;
                }
                if chunk.usage.is_some() {
                    usage = chunk.usage;
                }
                if chunk.done {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, collected = content.len(), "Reply stream aborted");
                return StreamOutcome::Aborted(e);
            }
        }
    }

    debug!(
        chars = content.len(),
        tool_calls = tool_calls.len(),
        "Reply stream drained"
    );
    StreamOutcome::Drained {
        content,
        tool_calls,
        usage,
    }
}
