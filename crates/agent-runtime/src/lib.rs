//! Agent runtime for executing agent loops
//!
//! This crate provides the runtime infrastructure for executing agents:
//! the [`AgentExecutor`] reasoning loop, the per-run
//! [`ConversationContext`], and the [`BatchRunner`] for running many
//! independent tasks with a bounded window.

pub mod batch;
pub mod context;
pub mod executor;
pub mod result;

// Re-export key types
pub use batch::{BatchRunner, BatchStats, BatchTask, TokenTotals};
pub use context::{ConversationContext, RunStatus};
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, ExecutorConfig, ExecutorEventHandler, NoOpEventHandler,
};
pub use result::{AgentResult, ToolCallRecord};
