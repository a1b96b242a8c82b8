use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use taskboard_core::errors::GatewayError;
use taskboard_core::messages::AssistantMessage;
use taskboard_core::provider::{CompletionProvider, CompletionRequest};

use crate::converter;
use crate::models;
use crate::sse::StreamAssembler;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection details for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: models::DEFAULT_BASE_URL.to_string(),
            model: models::DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

pub struct ChatCompletionsProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

impl ChatCompletionsProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: models::completions_url(&config.base_url),
            model: config.model,
            api_key: config.api_key.filter(|k| !k.expose_secret().trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn read_streamed(resp: reqwest::Response) -> Result<AssistantMessage, GatewayError> {
        let mut assembler = StreamAssembler::new();
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| GatewayError::NetworkError(e.to_string()))?;
            assembler.push(&chunk);
            if assembler.is_done() {
                break;
            }
        }
        assembler.finish()
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        "chat-completions"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn check_credentials(&self) -> Result<(), GatewayError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(GatewayError::MissingCredential(models::CREDENTIAL_NAME.into())),
        }
    }

    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len(), tools = request.tools.len(), stream = request.stream))]
    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantMessage, GatewayError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| GatewayError::MissingCredential(models::CREDENTIAL_NAME.into()))?;

        let body = converter::build_request_body(request, &self.model);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = GatewayError::from_status(status.as_u16(), body);
            warn!(status = status.as_u16(), kind = err.error_kind(), "completion request failed");
            return Err(err);
        }

        let message = if request.stream {
            Self::read_streamed(resp).await?
        } else {
            let json: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
            converter::parse_response(&json)?
        };

        debug!(
            tool_calls = message.tool_calls.len(),
            has_text = message.text_content().is_some(),
            "completion received"
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskboard_core::messages::Message;
    use taskboard_core::tools::ToolDefinition;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> ChatCompletionsProvider {
        ChatCompletionsProvider::new(ProviderConfig {
            base_url: server.uri(),
            model: "test-model".into(),
            api_key: Some(SecretString::from("sk-test")),
        })
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![Message::user_text("show my tasks")])
    }

    #[test]
    fn missing_key_fails_credential_check() {
        let provider = ChatCompletionsProvider::new(ProviderConfig::default()).unwrap();
        let err = provider.check_credentials().unwrap_err();
        assert_eq!(err.to_string(), "completion API key is not configured");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let provider = ChatCompletionsProvider::new(ProviderConfig {
            api_key: Some(SecretString::from("  ")),
            ..ProviderConfig::default()
        })
        .unwrap();
        assert!(provider.check_credentials().is_err());
    }

    #[test]
    fn endpoint_joins_base_url() {
        let provider = ChatCompletionsProvider::new(ProviderConfig {
            base_url: "http://localhost:9000/v1/".into(),
            ..ProviderConfig::default()
        })
        .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9000/v1/chat/completions");
        assert_eq!(provider.model(), models::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn posts_bearer_and_parses_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "test-model", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null, "tool_calls": [
                    {"id": "call_1", "type": "function",
                     "function": {"name": "list_tasks", "arguments": "{}"}}
                ]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let req = request().with_tools(vec![ToolDefinition {
            name: "list_tasks".into(),
            description: "List".into(),
            parameters_schema: json!({"type": "object"}),
        }]);
        let msg = provider_for(&server).complete(&req).await.unwrap();
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].name, "list_tasks");
    }

    #[tokio::test]
    async fn status_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;
        let err = provider_for(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::RateLimited));
    }

    #[tokio::test]
    async fn status_402_is_quota_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402))
            .mount(&server)
            .await;
        let err = provider_for(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::QuotaExhausted));
    }

    #[tokio::test]
    async fn other_status_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;
        let err = provider_for(&server).complete(&request()).await.unwrap_err();
        match err {
            GatewayError::ServiceError { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;
        let err = provider_for(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let provider = ChatCompletionsProvider::new(ProviderConfig {
            base_url: "http://127.0.0.1:1".into(),
            api_key: Some(SecretString::from("sk-test")),
            ..ProviderConfig::default()
        })
        .unwrap();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NetworkError(_)));
    }

    #[tokio::test]
    async fn streamed_body_is_assembled() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Added \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"your task.\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let msg = provider_for(&server)
            .complete(&request().streaming(true))
            .await
            .unwrap();
        assert_eq!(msg.text_content(), Some("Added your task."));
    }
}
