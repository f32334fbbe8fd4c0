//! Scripted provider for tests and offline development.

use async_trait::async_trait;
use colloquy_core::error::ProviderError;
use colloquy_core::message::{Message, MessageToolCall};
use colloquy_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
use std::sync::Mutex;

/// One scripted turn: a canned response or a canned failure.
pub enum ScriptedReply {
    Response(ProviderResponse),
    Failure(ProviderError),
}

/// A provider that replays a fixed sequence of replies.
///
/// Each `complete` call consumes the next reply in the script. Requests are
/// recorded so tests can assert on the exact message list sent. Embeddings
/// always succeed with a fixed small vector per input.
pub struct MockProvider {
    script: Mutex<std::collections::VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new(script: Vec<ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every turn with the same text.
    pub fn text(reply: &str) -> Self {
        Self::new(vec![ScriptedReply::Response(text_response(reply))])
    }

    /// A provider whose first call requests the given tool calls and whose
    /// second call answers with text.
    pub fn tool_then_text(tool_calls: Vec<MessageToolCall>, answer: &str) -> Self {
        Self::new(vec![
            ScriptedReply::Response(tool_call_response(tool_calls)),
            ScriptedReply::Response(text_response(answer)),
        ])
    }

    /// A provider that fails every call with the given error.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![ScriptedReply::Failure(error)])
    }

    /// The requests observed so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(ScriptedReply::Response(response)) => Ok(response),
            Some(ScriptedReply::Failure(error)) => Err(error),
            None => Err(ProviderError::NotConfigured(
                "mock script exhausted".into(),
            )),
        }
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        let embeddings = request.inputs.iter().map(|_| vec![1.0, 0.0, 0.0]).collect();
        Ok(EmbeddingResponse {
            embeddings,
            model: request.model,
            usage: None,
        })
    }
}

/// A canned text response.
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A canned response that requests tool calls.
pub fn tool_call_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    let mut message = Message::assistant("");
    message.tool_calls = tool_calls;
    ProviderResponse {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
