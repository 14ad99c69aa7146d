//! Tool calls and their results

use agent_llm::ContentBlock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool use id the result must answer
    pub id: String,
    /// Name of the tool to run
    pub name: String,
    /// Input passed to the tool
    pub input: Value,
}

impl ToolCall {
    /// Create a tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Read a tool call out of a tool use block
    ///
    /// Returns `None` for any other block kind.
    pub fn from_block(block: &ContentBlock) -> Option<Self> {
        match block {
            ContentBlock::ToolUse { id, name, input } => {
                Some(Self::new(id.clone(), name.clone(), input.clone()))
            }
            _ => None,
        }
    }
}

/// Outcome of running a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Output on success, failure reason on error
    pub content: Value,
    /// Whether the tool failed
    pub is_error: bool,
}

impl ToolResult {
    /// A successful result
    pub fn success(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// A failed result carrying a human-readable reason
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: Value::String(message.into()),
            is_error: true,
        }
    }

    /// Content as the string sent back to the model
    ///
    /// JSON strings are passed through unquoted; other values are serialized.
    pub fn content_string(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Protocol tool result block answering `tool_use_id`
    pub fn to_content_block(&self, tool_use_id: impl Into<String>) -> ContentBlock {
        if self.is_error {
            ContentBlock::tool_error(tool_use_id, self.content_string())
        } else {
            ContentBlock::tool_result(tool_use_id, self.content_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_block_has_no_error_flag() {
        let block = ToolResult::success(json!({"temp": 21})).to_content_block("toolu_1");
        let wire = serde_json::to_value(&block).unwrap();
        assert_eq!(
            wire,
            json!({
                "type": "tool_result",
                "tool_use_id": "toolu_1",
                "content": "{\"temp\":21}",
            })
        );
    }

    #[test]
    fn test_error_block_sets_flag() {
        let block = ToolResult::error("Tool not found: nope").to_content_block("toolu_2");
        assert_eq!(
            block,
            ContentBlock::tool_error("toolu_2", "Tool not found: nope")
        );
    }

    #[test]
    fn test_string_content_is_not_quoted() {
        assert_eq!(ToolResult::success("plain").content_string(), "plain");
    }

    #[test]
    fn test_from_block() {
        let block = ContentBlock::tool_use("id1", "echo", json!({"x": 1}));
        let call = ToolCall::from_block(&block).unwrap();
        assert_eq!(call, ToolCall::new("id1", "echo", json!({"x": 1})));
        assert!(ToolCall::from_block(&ContentBlock::text("hi")).is_none());
    }
}
