//! Folding a streamed chat-completions body into one assistant message.
//!
//! The body is a sequence of `data: {json}` lines terminated by `data: [DONE]`.
//! Chunks from the transport can split a line anywhere, so bytes sit in a
//! pending buffer until a full line is available. A complete line whose JSON
//! does not parse stays at the head of the buffer as provisional and is retried
//! when more bytes arrive. `finish` drains whatever is left.

use bytes::BytesMut;
use serde_json::Value;
use tracing::{debug, warn};

use taskboard_core::errors::GatewayError;
use taskboard_core::ids::ToolCallId;
use taskboard_core::messages::{AssistantMessage, ToolCallBlock};

#[derive(Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Accumulates streamed deltas.
#[derive(Default)]
pub struct StreamAssembler {
    pending: BytesMut,
    content: String,
    tool_calls: Vec<PartialToolCall>,
    chunks: usize,
    done: bool,
}

enum LineOutcome {
    Consumed,
    Provisional,
    Done,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` marker has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Text assembled so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Feed raw bytes from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.done {
            return;
        }
        self.pending.extend_from_slice(chunk);

        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line = trim_line(&self.pending[..newline]).to_owned();
            match self.process_line(&line, false) {
                LineOutcome::Consumed => {
                    let _ = self.pending.split_to(newline + 1);
                }
                LineOutcome::Provisional => break,
                LineOutcome::Done => {
                    self.pending.clear();
                    self.done = true;
                    return;
                }
            }
        }
    }

    /// Drain the pending buffer and build the message.
    pub fn finish(mut self) -> Result<AssistantMessage, GatewayError> {
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            for raw in rest[..].split(|&b| b == b'\n') {
                if let LineOutcome::Done = self.process_line(trim_line(raw), true) {
                    break;
                }
            }
        }

        if self.chunks == 0 {
            return Err(GatewayError::MalformedResponse("stream carried no data".into()));
        }

        let tool_calls = self
            .tool_calls
            .into_iter()
            .filter(|tc| !tc.name.is_empty())
            .map(|tc| ToolCallBlock {
                id: tc.id.map_or_else(ToolCallId::new, ToolCallId::from_raw),
                name: tc.name,
                arguments: tc.arguments,
            })
            .collect();

        Ok(AssistantMessage {
            content: (!self.content.is_empty()).then_some(self.content),
            tool_calls,
        })
    }

    fn process_line(&mut self, line: &[u8], flushing: bool) -> LineOutcome {
        let Ok(line) = std::str::from_utf8(line) else {
            if flushing {
                warn!("dropping non-UTF-8 stream line");
                return LineOutcome::Consumed;
            }
            return LineOutcome::Provisional;
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            return LineOutcome::Consumed;
        }
        let Some(data) = line.strip_prefix("data:") else {
            return LineOutcome::Consumed;
        };
        let data = data.trim_start();
        if data == "[DONE]" {
            return LineOutcome::Done;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(chunk) => {
                self.apply(&chunk);
                LineOutcome::Consumed
            }
            Err(e) if flushing => {
                warn!(error = %e, "dropping unparseable stream line");
                LineOutcome::Consumed
            }
            Err(_) => {
                debug!("stream line incomplete, waiting for more bytes");
                LineOutcome::Provisional
            }
        }
    }

    fn apply(&mut self, chunk: &Value) {
        self.chunks += 1;
        let Some(delta) = chunk.pointer("/choices/0/delta") else {
            return;
        };

        if let Some(text) = delta.get("content").and_then(Value::as_str) {
            self.content.push_str(text);
        }

        let Some(calls) = delta.get("tool_calls").and_then(Value::as_array) else {
            return;
        };
        for call in calls {
            let index = call
                .get("index")
                .and_then(Value::as_u64)
                .map_or(self.tool_calls.len().saturating_sub(1), |i| i as usize);
            while self.tool_calls.len() <= index {
                self.tool_calls.push(PartialToolCall::default());
            }
            let slot = &mut self.tool_calls[index];
            if let Some(id) = call.get("id").and_then(Value::as_str) {
                slot.id = Some(id.to_string());
            }
            if let Some(name) = call.pointer("/function/name").and_then(Value::as_str) {
                slot.name.push_str(name);
            }
            match call.pointer("/function/arguments") {
                Some(Value::String(part)) => slot.arguments.push_str(part),
                Some(Value::Null) | None => {}
                Some(other) => slot.arguments = other.to_string(),
            }
        }
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
