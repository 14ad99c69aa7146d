//! Tool management and execution framework for agent-rs
//!
//! This crate provides a framework for defining tools (functions) that agents
//! can call, a registry that holds them by unique name, and an executor that
//! runs a batch of tool calls concurrently while keeping results in
//! submission order.

pub mod executor;
pub mod function;
pub mod registry;
pub mod result;
pub mod tool;

pub use executor::{ParallelToolExecutor, ToolOutcome};
pub use function::FunctionTool;
pub use registry::ToolRegistry;
pub use result::{ToolCall, ToolResult};
pub use tool::Tool;
