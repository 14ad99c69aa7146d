//! Parallel tool execution
//!
//! The executor runs tool calls against a [`ToolRegistry`]. Every call gets
//! a result: an unknown tool name, a handler error and a handler panic all
//! become error results for that call only, so one bad call never takes down
//! its siblings. Results always come back in submission order.

use crate::{Tool, ToolCall, ToolRegistry, ToolResult};
use agent_core::{Error, Promise, run_bounded};
use futures::FutureExt;
use futures::future;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A tool call paired with its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// The call that was executed
    pub call: ToolCall,
    /// What the tool produced
    pub result: ToolResult,
    /// Wall-clock time spent in the handler
    pub duration_ms: u64,
}

/// Executes batches of tool calls against a registry
///
/// # Example
///
/// ```
/// use agent_tools::{FunctionTool, ParallelToolExecutor, ToolCall, ToolRegistry};
/// use agent_llm::tools::schema;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let registry = ToolRegistry::new();
/// registry
///     .register(Arc::new(FunctionTool::new("echo", "Echo", schema::empty(), |v| async move { Ok(v) })))
///     .unwrap();
///
/// let executor = ParallelToolExecutor::new(Arc::new(registry));
/// let outcomes = executor
///     .execute_batched(
///         vec![
///             ToolCall::new("1", "echo", json!("a")),
///             ToolCall::new("2", "missing", json!({})),
///         ],
///         2,
///     )
///     .await;
///
/// assert!(!outcomes[0].result.is_error);
/// assert!(outcomes[1].result.is_error);
/// # });
/// ```
#[derive(Clone)]
pub struct ParallelToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ParallelToolExecutor {
    /// Create an executor over a registry
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The registry calls are resolved against
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run a single call
    pub async fn execute_one(&self, call: ToolCall) -> ToolOutcome {
        let tool = self.registry.get(&call.name);
        invoke(tool, call).await
    }

    /// Run every call at once and wait for all of them
    ///
    /// Outcomes are in the same order as `calls`.
    pub async fn execute(&self, calls: Vec<ToolCall>) -> Vec<ToolOutcome> {
        debug!(call_count = calls.len(), "Executing tool calls");
        future::join_all(calls.into_iter().map(|call| self.execute_one(call))).await
    }

    /// Start every call on the runtime and return one promise per call
    ///
    /// Promises are in the same order as `calls`. Combine them with
    /// [`Promise::all`] or [`Promise::all_settled`].
    pub fn execute_async(&self, calls: Vec<ToolCall>) -> Vec<Promise<ToolOutcome>> {
        calls
            .into_iter()
            .map(|call| {
                let tool = self.registry.get(&call.name);
                Promise::spawn(async move { Ok(invoke(tool, call).await) })
            })
            .collect()
    }

    /// Run calls with at most `concurrency` in flight
    ///
    /// When one call finishes the next queued call starts. Outcomes are in
    /// the same order as `calls` regardless of completion order.
    pub async fn execute_batched(
        &self,
        calls: Vec<ToolCall>,
        concurrency: usize,
    ) -> Vec<ToolOutcome> {
        info!(
            call_count = calls.len(),
            concurrency = concurrency,
            "Executing tool calls in bounded window"
        );
        run_bounded(calls, concurrency, |call| self.execute_one(call)).await
    }
}

async fn invoke(tool: Option<Arc<dyn Tool>>, call: ToolCall) -> ToolOutcome {
    let Some(tool) = tool else {
        warn!(tool_name = %call.name, tool_id = %call.id, "Unknown tool requested");
        let result = ToolResult::error(Error::UnknownTool(call.name.clone()).to_string());
        return ToolOutcome {
            call,
            result,
            duration_ms: 0,
        };
    };

    // Log tool input (truncated for safety)
    let input_preview: String = call.input.to_string().chars().take(500).collect();
    info!(
        tool_name = %call.name,
        tool_id = %call.id,
        input_preview = %input_preview,
        "Executing tool"
    );

    let start_time = Instant::now();
    let outcome = AssertUnwindSafe(tool.execute(call.input.clone()))
        .catch_unwind()
        .await;
    let duration_ms = start_time.elapsed().as_millis() as u64;

    let result = match outcome {
        Ok(Ok(content)) => {
            let result = ToolResult::success(content);
            let result_preview: String = result.content_string().chars().take(500).collect();
            info!(
                tool_name = %call.name,
                duration_ms = duration_ms,
                result_preview = %result_preview,
                "Tool execution succeeded"
            );
            result
        }
        Ok(Err(e)) => {
            warn!(
                tool_name = %call.name,
                duration_ms = duration_ms,
                error = %e,
                "Tool execution failed"
            );
            ToolResult::error(format!("Error: {e}"))
        }
        Err(_) => {
            let e = Error::ToolExecution {
                tool: call.name.clone(),
                message: "handler panicked".to_string(),
            };
            warn!(tool_name = %call.name, duration_ms = duration_ms, "Tool handler panicked");
            ToolResult::error(format!("Error: {e}"))
        }
    };

    ToolOutcome {
        call,
        result,
        duration_ms,
    }
}
