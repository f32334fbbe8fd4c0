//! One conversation turn, end to end.
//!
//! A turn stages the user's message, optionally fetches reference material,
//! assembles the token-bounded context, streams the reply, and only then
//! commits to the conversation. A failed completion leaves the conversation
//! exactly as it was: no staged user message, no partial assistant reply.

use crate::reply_stream::{drain, StreamOutcome};
use colloquy_context::assembler::{ContextAssembler, UsageStats};
use colloquy_context::prefix::build_prefix;
use colloquy_context::retrieval::{augment, RetrievalSettings};
use colloquy_core::error::{Error, Result};
use colloquy_core::index::SimilarityIndex;
use colloquy_core::message::{Conversation, Message, MessageToolCall};
use colloquy_core::provider::{Provider, ProviderRequest, Usage};
use colloquy_core::tool::{ToolCall, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Retrieval wiring for a session: where to query and how.
pub struct RetrievalBinding {
    pub index: Arc<dyn SimilarityIndex>,
    pub settings: RetrievalSettings,
}

/// What one committed turn produced.
#[derive(Debug)]
pub struct TurnReport {
    /// The assistant's full reply text.
    pub reply: String,
    /// Token accounting for the assembled context.
    pub stats: UsageStats,
    /// Whether retrieved reference material was injected this turn.
    pub augmented: bool,
    /// Usage reported by the completion service, when available.
    pub usage: Option<Usage>,
}

/// Runs conversation turns against a provider.
pub struct TurnRunner {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    instructions: String,
    reference_text: Option<String>,
    assembler: ContextAssembler,
    retrieval: Option<RetrievalBinding>,
    tools: Option<Arc<ToolRegistry>>,
}

impl TurnRunner {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        budget: usize,
        instructions: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let assembler = ContextAssembler::new(budget, &model);
        Self {
            provider,
            model,
            temperature: 0.7,
            max_tokens: None,
            instructions: instructions.into(),
            reference_text: None,
            assembler,
            retrieval: None,
            tools: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Attach static reference material included in every turn's prefix.
    pub fn with_reference_text(mut self, text: impl Into<String>) -> Self {
        self.reference_text = Some(text.into());
        self
    }

    /// Attach a similarity index queried per turn for reference material.
    pub fn with_retrieval(mut self, index: Arc<dyn SimilarityIndex>, settings: RetrievalSettings) -> Self {
        self.retrieval = Some(RetrievalBinding { index, settings });
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Run one turn: stage the user's input, assemble, stream, commit.
    ///
    /// `on_fragment` fires for each reply fragment as it streams in. On
    /// error the conversation is left untouched.
    pub async fn run_turn<F>(
        &self,
        conversation: &mut Conversation,
        user_input: &str,
        mut on_fragment: F,
    ) -> Result<TurnReport>
    where
        F: FnMut(&str),
    {
        let user_message = Message::user(user_input);

        // Stage on a copy so the new message competes for budget like any
        // other history, without mutating the real conversation yet.
        let mut staged = conversation.clone();
        staged.push(user_message.clone());

        let retrieved = match &self.retrieval {
            Some(binding) => {
                augment(
                    user_input,
                    binding.index.as_ref(),
                    self.provider.as_ref(),
                    &binding.settings,
                )
                .await
            }
            None => None,
        };
        let augmented = retrieved.is_some();
        let reference = combine_reference(self.reference_text.as_deref(), retrieved.as_deref());

        let prefix = build_prefix(&self.instructions, reference.as_deref(), staged.greeting());
        let assembled = self.assembler.assemble(&staged, &prefix);
        let stats = assembled.stats;

        let tool_definitions = self
            .tools
            .as_ref()
            .map(|t| t.definitions())
            .unwrap_or_default();

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: assembled.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tool_definitions.clone(),
            stream: true,
        };

        let rx = self.provider.stream(request.clone()).await?;
        let (content, tool_calls, mut usage) = match drain(rx, &mut on_fragment).await {
            StreamOutcome::Drained {
                content,
                tool_calls,
                usage,
            } => (content, tool_calls, usage),
            StreamOutcome::Aborted(e) => return Err(Error::Provider(e)),
        };

        // Messages to append once the whole turn has succeeded.
        let mut commits: Vec<Message> = vec![user_message];

        let tool_registry = self.tools.as_ref().filter(|_| !tool_calls.is_empty());
        let reply = if let Some(registry) = tool_registry {
            info!(calls = tool_calls.len(), "Reply requested tool calls");

            let mut assistant_call = Message::assistant(content);
            assistant_call.tool_calls = tool_calls.clone();

            let mut round_messages = request.messages.clone();
            round_messages.push(assistant_call.clone());
            commits.push(assistant_call);

            for call in &tool_calls {
                let result_message = execute_call(registry, call).await;
                round_messages.push(result_message.clone());
                commits.push(result_message);
            }

            let followup = ProviderRequest {
                model: self.model.clone(),
                messages: round_messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions,
                stream: true,
            };
            let rx = self.provider.stream(followup).await?;
            match drain(rx, &mut on_fragment).await {
                StreamOutcome::Drained {
                    content,
                    usage: round_usage,
                    ..
                } => {
                    if round_usage.is_some() {
                        usage = round_usage;
                    }
                    content
                }
                StreamOutcome::Aborted(e) => return Err(Error::Provider(e)),
            }
        } else {
            content
        };

        commits.push(Message::assistant(reply.clone()));
        for message in commits {
            conversation.push(message);
        }

        debug!(
            total_tokens = stats.total_tokens,
            dropped = stats.dropped_messages,
            augmented,
            "Turn committed"
        );

        Ok(TurnReport {
            reply,
            stats,
            augmented,
            usage,
        })
    }
}

/// Join static reference text and the per-turn retrieval block.
fn combine_reference(static_text: Option<&str>, retrieved: Option<&str>) -> Option<String> {
    match (static_text, retrieved) {
        (Some(s), Some(r)) => Some(format!("{s}\n\n{r}")),
        (Some(s), None) => Some(s.to_string()),
        (None, Some(r)) => Some(r.to_string()),
        (None, None) => None,
    }
}

/// Run one tool call and shape its outcome as a tool message.
///
/// Execution failures are fed back to the model as the tool output rather
/// than aborting the turn.
async fn execute_call(registry: &ToolRegistry, call: &MessageToolCall) -> Message {
    let arguments = match serde_json::from_str(&call.arguments) {
        Ok(value) => value,
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool call arguments were not valid JSON");
            return Message::tool_result(&call.id, format!("error: invalid arguments: {e}"));
        }
    };

    let tool_call = ToolCall {
        id: call.id.clone(),
        name: call.name.clone(),
        arguments,
    };

    match registry.execute(&tool_call).await {
        Ok(result) => Message::tool_result(&call.id, result.output),
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool execution failed");
            Message::tool_result(&call.id, format!("error: {e}"))
        }
    }
}
