//! Model-client protocol layer for agent-rs
//!
//! This crate provides provider-agnostic types for talking to a
//! tool-using language model. It includes:
//!
//! - Message and content-block types (text, tool use, tool result)
//! - Completion request/response types with stop reason and token usage
//! - Tool definitions and JSON-schema helpers
//! - The [`LLMProvider`] trait that concrete model clients implement

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;
