use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::messages::{AssistantMessage, Message};
use crate::tools::ToolDefinition;

/// Everything sent to a completion provider for one round.
#[derive(Clone, Debug, Default)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    /// Empty means no tools are offered for this round.
    pub tools: Vec<ToolDefinition>,
    /// Ask for a streamed body; the provider folds it into one reply.
    pub stream: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            stream: false,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// A chat-completion service with function calling.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    /// Fails with `MissingCredential` when the provider cannot authenticate.
    fn check_credentials(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantMessage, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builders() {
        let req = CompletionRequest::new(vec![Message::user_text("hi")])
            .with_tools(vec![ToolDefinition {
                name: "list_tasks".into(),
                description: "List".into(),
                parameters_schema: serde_json::json!({"type": "object"}),
            }])
            .streaming(true);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.tools.len(), 1);
        assert!(req.stream);
        assert!(!CompletionRequest::default().stream);
    }
}
