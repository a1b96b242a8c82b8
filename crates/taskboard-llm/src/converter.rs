use serde_json::{json, Value};
use tracing::warn;

use taskboard_core::errors::GatewayError;
use taskboard_core::ids::ToolCallId;
use taskboard_core::messages::{AssistantMessage, Message, ToolCallBlock};
use taskboard_core::provider::CompletionRequest;
use taskboard_core::tools::ToolDefinition;

/// Build the chat-completions request body.
pub fn build_request_body(request: &CompletionRequest, model: &str) -> Value {
    let mut body = json!({
        "model": model,
        "messages": convert_messages(&request.messages),
        "stream": request.stream,
    });

    if !request.tools.is_empty() {
        body["tools"] = Value::Array(request.tools.iter().map(convert_tool).collect());
    }

    body
}

fn convert_messages(messages: &[Message]) -> Vec<Value> {
    messages.iter().map(convert_message).collect()
}

fn convert_message(msg: &Message) -> Value {
    match msg {
        Message::System { content } => json!({"role": "system", "content": content}),
        Message::User { content } => json!({"role": "user", "content": content}),
        Message::Assistant(asst) => {
            let mut entry = json!({
                "role": "assistant",
                "content": asst.content.clone().map_or(Value::Null, Value::String),
            });
            if asst.has_tool_calls() {
                entry["tool_calls"] =
                    Value::Array(asst.tool_calls.iter().map(convert_tool_call).collect());
            }
            entry
        }
        Message::Tool(result) => json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id.as_str(),
            "content": result.content,
        }),
    }
}

fn convert_tool_call(tc: &ToolCallBlock) -> Value {
    json!({
        "id": tc.id.as_str(),
        "type": "function",
        "function": {
            "name": tc.name,
            "arguments": tc.arguments,
        },
    })
}

fn convert_tool(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters_schema,
        },
    })
}

/// Extract the first choice's message from a non-streamed response body.
pub fn parse_response(body: &Value) -> Result<AssistantMessage, GatewayError> {
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| GatewayError::MalformedResponse("response has no choices[0].message".into()))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string);

    let tool_calls = match message.get("tool_calls") {
        Some(Value::Array(calls)) => calls.iter().map(parse_tool_call).collect::<Result<_, _>>()?,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            return Err(GatewayError::MalformedResponse(format!(
                "tool_calls is not an array: {other}"
            )))
        }
    };

    Ok(AssistantMessage { content, tool_calls })
}

fn parse_tool_call(call: &Value) -> Result<ToolCallBlock, GatewayError> {
    let name = call
        .pointer("/function/name")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::MalformedResponse("tool call without function.name".into()))?;

    let id = match call.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => ToolCallId::from_raw(id),
        _ => {
            warn!(tool_name = name, "tool call without id, minting one");
            ToolCallId::new()
        }
    };

    Ok(ToolCallBlock {
        id,
        name: name.to_string(),
        arguments: normalize_arguments(call.pointer("/function/arguments")),
    })
}

/// Tool arguments arrive either as JSON text or as an already-decoded object.
/// Both become JSON text.
pub fn normalize_arguments(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
