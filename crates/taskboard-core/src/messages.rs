use serde::{Deserialize, Serialize};

use crate::ids::ToolCallId;

/// Speaker of a transcript entry as the chat UI sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the client-held chat transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation entry sent to a completion provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant(AssistantMessage),
    Tool(ToolResultMessage),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallBlock>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResultMessage {
    pub tool_call_id: ToolCallId,
    pub content: String,
}

/// A function call requested by the model. `arguments` is the raw JSON text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallBlock {
    pub id: ToolCallId,
    pub name: String,
    pub arguments: String,
}

impl ToolCallBlock {
    /// Decode the argument text. Blank text is an empty object.
    pub fn parsed_arguments(&self) -> Result<serde_json::Value, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(&self.arguments)
    }
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user_text(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Message::Assistant(AssistantMessage::text(content))
    }

    pub fn tool_result(tool_call_id: ToolCallId, content: impl Into<String>) -> Self {
        Message::Tool(ToolResultMessage {
            tool_call_id,
            content: content.into(),
        })
    }
}

impl From<ChatMessage> for Message {
    fn from(msg: ChatMessage) -> Self {
        match msg.role {
            Role::User => Message::user_text(msg.content),
            Role::Assistant => Message::assistant_text(msg.content),
        }
    }
}

impl AssistantMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Text content, treating blank text as absent.
    pub fn text_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_wire_shape() {
        let msg: ChatMessage = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(msg, ChatMessage::user("hi"));
        let json = serde_json::to_value(ChatMessage::assistant("yo")).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn chat_message_converts_to_provider_message() {
        assert_eq!(Message::from(ChatMessage::user("a")), Message::user_text("a"));
        assert_eq!(
            Message::from(ChatMessage::assistant("b")),
            Message::assistant_text("b")
        );
    }

    #[test]
    fn message_role_tags() {
        let json = serde_json::to_value(Message::system("rules")).unwrap();
        assert_eq!(json["role"], "system");
        let json = serde_json::to_value(Message::tool_result(ToolCallId::from_raw("call_1"), "ok")).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
    }

    #[test]
    fn parsed_arguments() {
        let call = ToolCallBlock {
            id: ToolCallId::from_raw("call_1"),
            name: "add_task".into(),
            arguments: r#"{"title":"Write report"}"#.into(),
        };
        assert_eq!(call.parsed_arguments().unwrap()["title"], "Write report");

        let blank = ToolCallBlock {
            arguments: "  ".into(),
            ..call.clone()
        };
        assert!(blank.parsed_arguments().unwrap().as_object().unwrap().is_empty());

        let broken = ToolCallBlock {
            arguments: "{title".into(),
            ..call
        };
        assert!(broken.parsed_arguments().is_err());
    }

    #[test]
    fn text_content_ignores_blank() {
        assert_eq!(AssistantMessage::text("done").text_content(), Some("done"));
        assert_eq!(AssistantMessage::text("  ").text_content(), None);
        assert_eq!(AssistantMessage::default().text_content(), None);
    }
}
