//! Results of agent runs

use agent_llm::{Message, TokenUsage};
use agent_tools::ToolOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tool call made during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool use id from the model
    pub id: String,
    /// Tool name
    pub name: String,
    /// Input the model supplied
    pub input: Value,
    /// Output, or failure reason when `is_error` is set
    pub output: Value,
    /// Whether the call failed
    pub is_error: bool,
    /// Wall-clock time spent in the handler
    pub duration_ms: u64,
}

impl From<&ToolOutcome> for ToolCallRecord {
    fn from(outcome: &ToolOutcome) -> Self {
        Self {
            id: outcome.call.id.clone(),
            name: outcome.call.name.clone(),
            input: outcome.call.input.clone(),
            output: outcome.result.content.clone(),
            is_error: outcome.result.is_error,
            duration_ms: outcome.duration_ms,
        }
    }
}

/// Final outcome of one agent run
///
/// Failures are reported here rather than as `Err`, so a failed run still
/// carries the conversation and usage it accumulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Whether the run completed
    pub success: bool,
    /// Final answer on success
    pub answer: Option<String>,
    /// Human-readable reason on failure
    pub error: Option<String>,
    /// Iterations used
    pub iterations: usize,
    /// Full message log
    pub messages: Vec<Message>,
    /// Token usage summed over every model call
    pub usage: TokenUsage,
    /// Tool calls in the order they were answered
    pub tool_calls: Vec<ToolCallRecord>,
}

impl AgentResult {
    /// A failed result for a run that never produced a conversation
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            answer: None,
            error: Some(error.into()),
            iterations: 0,
            messages: Vec::new(),
            usage: TokenUsage::default(),
            tool_calls: Vec::new(),
        }
    }

    /// Total tokens used (input + output)
    pub fn total_tokens(&self) -> usize {
        self.usage.total()
    }
}
