//! Conversation state for one agent run
//!
//! A [`ConversationContext`] is owned by exactly one run. Its message log is
//! append-only: messages can be added and read, never edited or removed, so
//! observers handed a `&ConversationContext` always see a consistent prefix
//! of the conversation.

use crate::executor::ExecutorConfig;
use crate::result::{AgentResult, ToolCallRecord};
use agent_llm::{Message, TokenUsage};
use agent_tools::{Tool, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Still running
    Pending,
    /// Finished with an answer
    Completed,
    /// Finished with an error
    Failed,
}

/// State accumulated while driving one run
///
/// # Example
///
/// ```
/// use agent_runtime::{ConversationContext, ExecutorConfig, RunStatus};
/// use agent_tools::ToolRegistry;
/// use std::sync::Arc;
///
/// let mut ctx = ConversationContext::new(
///     "What is 2 + 2?",
///     Arc::new(ToolRegistry::new()),
///     ExecutorConfig::default(),
/// );
/// assert_eq!(ctx.messages().len(), 1);
///
/// ctx.complete("4");
/// assert_eq!(ctx.status(), RunStatus::Completed);
/// assert_eq!(ctx.answer(), Some("4"));
/// ```
#[derive(Clone)]
pub struct ConversationContext {
    task: String,
    messages: Vec<Message>,
    tools: Arc<ToolRegistry>,
    config: ExecutorConfig,
    iteration: usize,
    usage: TokenUsage,
    tool_calls: Vec<ToolCallRecord>,
    status: RunStatus,
    answer: Option<String>,
    error: Option<String>,
}

impl ConversationContext {
    /// Start a conversation with the task as the first user message
    pub fn new(task: impl Into<String>, tools: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        Self::with_history(task, Vec::new(), tools, config)
    }

    /// Start a conversation after earlier messages
    pub fn with_history(
        task: impl Into<String>,
        history: Vec<Message>,
        tools: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        let task = task.into();
        let mut messages = history;
        messages.push(Message::user(task.clone()));
        Self {
            task,
            messages,
            tools,
            config,
            iteration: 0,
            usage: TokenUsage::default(),
            tool_calls: Vec::new(),
            status: RunStatus::Pending,
            answer: None,
            error: None,
        }
    }

    /// The task this run was started with
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Messages so far, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a message to the log
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Look up a tool by name
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// The tool set available to this run
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Run configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Record a finished tool call
    pub fn record_tool_call(&mut self, record: ToolCallRecord) {
        self.tool_calls.push(record);
    }

    /// Tool calls recorded so far
    pub fn tool_calls(&self) -> &[ToolCallRecord] {
        &self.tool_calls
    }

    /// Advance to the next iteration and return its number (1-based)
    pub fn increment_iteration(&mut self) -> usize {
        self.iteration += 1;
        self.iteration
    }

    /// Iterations started so far
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Whether the iteration budget is used up
    pub fn has_reached_max_iterations(&self) -> bool {
        self.iteration >= self.config.max_iterations
    }

    /// Add one model call's usage to the running totals
    pub fn add_usage(&mut self, usage: TokenUsage) {
        self.usage.accumulate(usage);
    }

    /// Usage summed over every model call so far
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Mark the run completed
    ///
    /// Ignored if the run already reached a terminal status.
    pub fn complete(&mut self, answer: impl Into<String>) {
        if self.is_terminal() {
            debug!(status = ?self.status, "Ignoring completion of finished run");
            return;
        }
        self.status = RunStatus::Completed;
        self.answer = Some(answer.into());
    }

    /// Mark the run failed
    ///
    /// Ignored if the run already reached a terminal status.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.is_terminal() {
            debug!(status = ?self.status, "Ignoring failure of finished run");
            return;
        }
        self.status = RunStatus::Failed;
        self.error = Some(reason.into());
    }

    /// Current status
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Whether the run has completed or failed
    pub fn is_terminal(&self) -> bool {
        self.status != RunStatus::Pending
    }

    /// Final answer, once completed
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Failure reason, once failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Consume the context into a result
    pub fn into_result(self) -> AgentResult {
        AgentResult {
            success: self.status == RunStatus::Completed,
            answer: self.answer,
            error: self.error,
            iterations: self.iteration,
            messages: self.messages,
            usage: self.usage,
            tool_calls: self.tool_calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(max_iterations: usize) -> ConversationContext {
        let config = ExecutorConfig {
            max_iterations,
            ..ExecutorConfig::default()
        };
        ConversationContext::new("task", Arc::new(ToolRegistry::new()), config)
    }

    #[test]
    fn test_task_seeds_log() {
        let ctx = context(3);
        assert_eq!(ctx.task(), "task");
        assert_eq!(ctx.messages(), &[Message::user("task")]);
        assert_eq!(ctx.status(), RunStatus::Pending);
    }

    #[test]
    fn test_history_precedes_task() {
        let ctx = ConversationContext::with_history(
            "next",
            vec![Message::user("hi"), Message::assistant("hello")],
            Arc::new(ToolRegistry::new()),
            ExecutorConfig::default(),
        );
        assert_eq!(ctx.messages().len(), 3);
        assert_eq!(ctx.messages()[2].text(), "next");
    }

    #[test]
    fn test_iteration_budget() {
        let mut ctx = context(2);
        assert!(!ctx.has_reached_max_iterations());
        assert_eq!(ctx.increment_iteration(), 1);
        assert!(!ctx.has_reached_max_iterations());
        assert_eq!(ctx.increment_iteration(), 2);
        assert!(ctx.has_reached_max_iterations());
    }

    #[test]
    fn test_usage_accumulates() {
        let mut ctx = context(2);
        ctx.add_usage(TokenUsage::new(10, 5));
        ctx.add_usage(TokenUsage::new(3, 1));
        assert_eq!(ctx.usage(), TokenUsage::new(13, 6));
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut ctx = context(2);
        ctx.fail("transport down");
        ctx.complete("late answer");
        assert_eq!(ctx.status(), RunStatus::Failed);
        assert_eq!(ctx.answer(), None);

        let result = ctx.into_result();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("transport down"));
    }
}
