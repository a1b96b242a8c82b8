use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use taskboard_core::errors::GatewayError;
use taskboard_core::ids::ToolCallId;
use taskboard_core::messages::{AssistantMessage, ToolCallBlock};
use taskboard_core::provider::{CompletionProvider, CompletionRequest};

/// One scripted reply.
pub type MockReply = Result<AssistantMessage, GatewayError>;

/// Provider that answers from a script, in order, and remembers what it was asked.
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: AtomicUsize,
    has_credentials: bool,
}

impl MockProvider {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            has_credentials: true,
        }
    }

    /// A provider whose credential check fails.
    pub fn without_credentials() -> Self {
        Self {
            has_credentials: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

/// Reply with plain text.
pub fn text_reply(text: &str) -> MockReply {
    Ok(AssistantMessage::text(text))
}

/// Reply with tool calls given as `(id, name, arguments)`.
pub fn tool_calls_reply(calls: &[(&str, &str, Value)]) -> MockReply {
    Ok(AssistantMessage {
        content: None,
        tool_calls: calls
            .iter()
            .map(|(id, name, args)| ToolCallBlock {
                id: ToolCallId::from_raw(*id),
                name: (*name).to_string(),
                arguments: args.to_string(),
            })
            .collect(),
    })
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn check_credentials(&self) -> Result<(), GatewayError> {
        if self.has_credentials {
            Ok(())
        } else {
            Err(GatewayError::MissingCredential(crate::models::CREDENTIAL_NAME.into()))
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantMessage, GatewayError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().push(request.clone());
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Err(GatewayError::MalformedResponse(format!(
                "MockProvider: no response configured for call {idx}"
            )))
        })
    }
}
