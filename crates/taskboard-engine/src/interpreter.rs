//! Two-round chat pipeline: ask the model, run whatever tools it asked for,
//! then ask it again to summarise.
//!
//! Stages are explicit values. `FirstResponse` is what round one produced,
//! `ToolRound` is the tool messages and actions from executing it, and
//! `ChatReply` is what goes back to the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use taskboard_core::messages::{AssistantMessage, ChatMessage, Message, ToolCallBlock};
use taskboard_core::provider::{CompletionProvider, CompletionRequest};
use taskboard_core::tools::{ToolContext, ToolError};
use taskboard_core::{Action, RequestId};

use crate::error::EngineError;
use crate::registry::ToolRegistry;

pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant integrated into a Kanban task management board. \
You can manage tasks directly using the provided tools. When a user asks to add, delete, update, or list tasks, \
use the appropriate tool. Keep answers clear, concise, and actionable. Use markdown formatting when helpful.";

pub const FIRST_ROUND_FALLBACK: &str = "I'm not sure how to help with that.";
pub const SECOND_ROUND_FALLBACK: &str = "Done!";

pub const DEFAULT_MAX_TOOL_CALLS: usize = 8;

#[derive(Clone, Debug)]
pub struct InterpreterConfig {
    /// Tool calls past this many are answered with a skipped result.
    pub max_tool_calls: usize,
    /// Request the summary round as a stream.
    pub stream_summary: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
            stream_summary: false,
        }
    }
}

/// Where a request is in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpreterState {
    Idle,
    AwaitingFirstCompletion,
    ExecutingTools,
    AwaitingSecondCompletion,
    Responding,
}

impl InterpreterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingFirstCompletion => "awaiting_first_completion",
            Self::ExecutingTools => "executing_tools",
            Self::AwaitingSecondCompletion => "awaiting_second_completion",
            Self::Responding => "responding",
        }
    }
}

impl std::fmt::Display for InterpreterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of round one.
#[derive(Debug)]
pub enum FirstResponse {
    Text(String),
    ToolCalls(AssistantMessage),
}

/// Tool messages to append for round two, with the board changes they made.
#[derive(Debug, Default)]
pub struct ToolRound {
    pub messages: Vec<Message>,
    pub actions: Vec<Action>,
}

impl ToolRound {
    /// Tool result texts joined line by line.
    fn result_text(&self) -> String {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Tool(result) => Some(result.content.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    pub actions: Vec<Action>,
}

pub struct CommandInterpreter {
    provider: Arc<dyn CompletionProvider>,
    registry: Arc<ToolRegistry>,
    config: InterpreterConfig,
}

impl CommandInterpreter {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        registry: Arc<ToolRegistry>,
        config: InterpreterConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    fn transition(&self, request_id: &RequestId, state: InterpreterState) {
        debug!(request_id = %request_id, state = %state, "interpreter state");
    }

    /// Run one chat request against the caller-held history.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty, history = history.len()))]
    pub async fn handle(&self, history: Vec<ChatMessage>) -> Result<ChatReply, EngineError> {
        let request_id = RequestId::new();
        tracing::Span::current().record("request_id", tracing::field::display(&request_id));
        self.transition(&request_id, InterpreterState::Idle);

        self.provider.check_credentials()?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(SYSTEM_PROMPT));
        messages.extend(history.into_iter().map(Message::from));

        self.transition(&request_id, InterpreterState::AwaitingFirstCompletion);
        let assistant = match self.first_round(&messages).await? {
            FirstResponse::Text(content) => {
                self.transition(&request_id, InterpreterState::Responding);
                let reply = ChatReply {
                    content,
                    actions: Vec::new(),
                };
                self.transition(&request_id, InterpreterState::Idle);
                return Ok(reply);
            }
            FirstResponse::ToolCalls(assistant) => assistant,
        };

        self.transition(&request_id, InterpreterState::ExecutingTools);
        let ctx = ToolContext::new(request_id.clone());
        let round = self.execute_tools(&assistant.tool_calls, &ctx).await;

        self.transition(&request_id, InterpreterState::AwaitingSecondCompletion);
        messages.push(Message::Assistant(assistant));
        let content = match self.second_round(&messages, &round).await {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    kind = e.error_kind(),
                    error = %e,
                    "summary round failed, replying with tool results"
                );
                round.result_text()
            }
        };

        self.transition(&request_id, InterpreterState::Responding);
        info!(request_id = %request_id, actions = round.actions.len(), "chat request handled");
        let reply = ChatReply {
            content,
            actions: round.actions,
        };
        self.transition(&request_id, InterpreterState::Idle);
        Ok(reply)
    }

    async fn first_round(&self, messages: &[Message]) -> Result<FirstResponse, EngineError> {
        let request =
            CompletionRequest::new(messages.to_vec()).with_tools(self.registry.definitions());
        let reply = self.provider.complete(&request).await?;

        if reply.has_tool_calls() {
            Ok(FirstResponse::ToolCalls(reply))
        } else {
            let text = reply.text_content().unwrap_or(FIRST_ROUND_FALLBACK);
            Ok(FirstResponse::Text(text.to_string()))
        }
    }

    /// Execute calls in order. Every call id gets exactly one tool message.
    async fn execute_tools(&self, calls: &[ToolCallBlock], ctx: &ToolContext) -> ToolRound {
        let mut round = ToolRound::default();
        for (idx, call) in calls.iter().enumerate() {
            let content = if idx >= self.config.max_tool_calls {
                warn!(tool = %call.name, limit = self.config.max_tool_calls, "tool call skipped");
                format!(
                    "Skipped: at most {} tool calls run per request",
                    self.config.max_tool_calls
                )
            } else {
                let (content, action) = self.execute_one(call, ctx).await;
                round.actions.extend(action);
                content
            };
            round.messages.push(Message::tool_result(call.id.clone(), content));
        }
        round
    }

    #[instrument(skip(self, ctx), fields(tool = %call.name, call_id = %call.id))]
    async fn execute_one(&self, call: &ToolCallBlock, ctx: &ToolContext) -> (String, Option<Action>) {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!("unknown tool requested");
            return (format!("Unknown tool: {}", call.name), None);
        };

        let args = match call.parsed_arguments() {
            Ok(args) => args,
            Err(e) => return (format!("Invalid arguments for {}: {e}", call.name), None),
        };

        match tool.execute(args, ctx).await {
            Ok(output) => {
                debug!(duration_ms = output.duration.as_millis() as u64, "tool finished");
                (output.content, output.action)
            }
            Err(ToolError::InvalidArguments(msg)) => {
                (format!("Invalid arguments for {}: {msg}", call.name), None)
            }
            Err(ToolError::ExecutionFailed(msg)) => (format!("Error: {msg}"), None),
        }
    }

    async fn second_round(
        &self,
        messages: &[Message],
        round: &ToolRound,
    ) -> Result<String, taskboard_core::errors::GatewayError> {
        let mut full = messages.to_vec();
        full.extend(round.messages.iter().cloned());
        let request = CompletionRequest::new(full).streaming(self.config.stream_summary);
        let reply = self.provider.complete(&request).await?;
        Ok(reply
            .text_content()
            .unwrap_or(SECOND_ROUND_FALLBACK)
            .to_string())
    }
}
