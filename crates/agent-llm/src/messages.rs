//! Message types for model communication
//!
//! This module defines the conversation message types used by the agent
//! loop, following the Anthropic Messages API shape: every message carries a
//! role and an ordered list of content blocks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message (task input and tool results)
    User,
    /// Assistant message (model output)
    Assistant,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Tool use request from assistant
    ToolUse {
        /// Unique ID for this tool use
        id: String,
        /// Tool name
        name: String,
        /// Tool input parameters (JSON)
        input: Value,
    },

    /// Tool result from user
    ToolResult {
        /// ID of the tool use this is responding to
        tool_use_id: String,
        /// Result content
        content: String,
        /// Only present (and `true`) on failure
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

impl ContentBlock {
    /// Create a text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool use block
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Create a successful tool result block
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: None,
        }
    }

    /// Create an error tool result block
    pub fn tool_error(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: Some(true),
        }
    }

    /// Whether this is a tool use block
    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse { .. })
    }

    /// Make an empty tool input serialize as `{}`
    ///
    /// Providers sometimes hand back `null` or `[]` for a tool called without
    /// arguments; the API rejects either when the block is sent back.
    pub fn normalize_input(&mut self) {
        if let Self::ToolUse { input, .. } = self {
            let empty = match input {
                Value::Null => true,
                Value::Array(items) => items.is_empty(),
                _ => false,
            };
            if empty {
                *input = Value::Object(Map::new());
            }
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Ordered content blocks
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a message from blocks
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    /// Create a user message answering one turn's tool uses
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self::new(Role::User, results)
    }

    /// Normalize every tool use input in this message
    pub fn normalize_tool_inputs(mut self) -> Self {
        for block in &mut self.content {
            block.normalize_input();
        }
        self
    }

    /// Text blocks joined by newlines
    ///
    /// Returns an empty string when the message has no text.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Extract tool use requests, in the order the model emitted them
    pub fn tool_uses(&self) -> Vec<&ContentBlock> {
        self.content.iter().filter(|b| b.is_tool_use()).collect()
    }

    /// Check if this message contains any tool uses
    pub fn has_tool_uses(&self) -> bool {
        self.content.iter().any(ContentBlock::is_tool_use)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
    }

    #[test]
    fn test_text_joins_all_text_blocks() {
        let msg = Message::new(
            Role::Assistant,
            vec![
                ContentBlock::text("first"),
                ContentBlock::tool_use("t1", "noop", json!({})),
                ContentBlock::text("second"),
            ],
        );
        assert_eq!(msg.text(), "first\nsecond");
        assert_eq!(msg.tool_uses().len(), 1);
    }

    #[test]
    fn test_tool_result_wire_shape() {
        let ok = serde_json::to_value(ContentBlock::tool_result("toolu_1", "42")).unwrap();
        assert_eq!(
            ok,
            json!({"type": "tool_result", "tool_use_id": "toolu_1", "content": "42"})
        );

        let err = serde_json::to_value(ContentBlock::tool_error("toolu_2", "nope")).unwrap();
        assert_eq!(err["is_error"], json!(true));
    }

    #[test]
    fn test_normalize_empty_input() {
        let msg = Message::new(
            Role::Assistant,
            vec![
                ContentBlock::tool_use("a", "clock", json!([])),
                ContentBlock::tool_use("b", "clock", Value::Null),
                ContentBlock::tool_use("c", "echo", json!({"text": "hi"})),
            ],
        )
        .normalize_tool_inputs();

        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["content"][0]["input"], json!({}));
        assert_eq!(wire["content"][1]["input"], json!({}));
        assert_eq!(wire["content"][2]["input"], json!({"text": "hi"}));
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("Test");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, msg);
    }
}
