//! Model client trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for model clients
///
/// Implementations wrap a concrete model service. The agent loop treats any
/// error returned here as a transport failure for the current run and does
/// not retry; retry policy, if any, belongs inside the implementation.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the model
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages, tools, and parameters
    ///
    /// # Returns
    ///
    /// The content blocks of the assistant's turn, its stop reason and usage
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "anthropic", "openai")
    fn name(&self) -> &str;
}
