//! Agent executor for running agent loops
//!
//! The AgentExecutor implements the core agent loop pattern:
//! 1. Call LLM with conversation history and available tools
//! 2. Answer every tool use in the response, whatever the stop reason
//! 3. If tools ran, send their results back and loop
//! 4. If the model finished its turn naturally, return the final answer
//! 5. Otherwise give the model another turn to finish its output
//!
//! Tool failures never end a run; they go back to the model as error
//! results. A model-client failure fails the run immediately, and so does
//! running out of iterations.

use crate::context::ConversationContext;
use crate::result::{AgentResult, ToolCallRecord};
use agent_core::{Error, Result};
use agent_llm::{CompletionRequest, CompletionResponse, LLMProvider, Message};
use agent_tools::{ParallelToolExecutor, ToolCall, ToolOutcome, ToolRegistry, ToolResult};
use agent_utils::Settings;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Event handler for agent execution events
///
/// Implement this trait to receive callbacks during agent execution, useful
/// for streaming progress to clients. Handlers observe; nothing they do
/// changes how the loop proceeds.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called after each model response, once its usage has been counted
    async fn on_iteration(
        &self,
        _iteration: usize,
        _response: &CompletionResponse,
        _context: &ConversationContext,
    ) {
    }

    /// Called when a tool execution starts
    async fn on_tool_start(&self, _id: &str, _name: &str, _input: &Value) {}

    /// Called when a tool execution completes, in tool use order
    async fn on_tool_execution(&self, _name: &str, _input: &Value, _result: &ToolResult) {}

    /// Called when the agent completes
    async fn on_complete(&self, _answer: &str) {}

    /// Called when the run fails
    async fn on_error(&self, _error: &str) {}
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of iterations (prevents infinite loops)
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,

    /// Tool calls in flight when one turn requests several
    pub tool_concurrency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: "claude-sonnet-4-5-20250929".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: Some(0.7),
            tool_concurrency: 5,
        }
    }
}

impl From<&Settings> for ExecutorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            model: settings.model.clone(),
            system_prompt: None,
            max_tokens: settings.max_tokens,
            temperature: Some(settings.temperature),
            tool_concurrency: settings.tool_concurrency,
        }
    }
}

/// Executes an agent loop: LLM → tool calls → execution → loop back
///
/// The AgentExecutor orchestrates the interaction between an LLM provider
/// and a tool registry, implementing the agent loop pattern. It holds no
/// per-run state, so one executor can drive many runs concurrently.
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
            event_handler: None,
        }
    }

    /// Create a new executor builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Set the event handler for receiving execution events
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the event handler (mutable reference version)
    pub fn set_event_handler(&mut self, handler: Arc<dyn ExecutorEventHandler>) {
        self.event_handler = Some(handler);
    }

    /// Get a reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get a reference to the tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Fresh conversation for `task` over this executor's tools and config
    pub fn new_context(&self, task: impl Into<String>) -> ConversationContext {
        ConversationContext::new(task, self.tool_registry.clone(), self.config.clone())
    }

    /// Execute the agent loop with a user query
    ///
    /// # Arguments
    ///
    /// * `task` - The user's input message
    ///
    /// # Returns
    ///
    /// The run's result; failures are reported through `success` and `error`
    pub async fn run(&self, task: impl Into<String>) -> AgentResult {
        let mut context = self.new_context(task);
        self.drive(&mut context, self.event_handler.as_ref()).await;
        context.into_result()
    }

    /// Execute the agent loop with conversation history
    ///
    /// # Arguments
    ///
    /// * `task` - The user's input message
    /// * `history` - Previous conversation messages
    pub async fn run_with_history(
        &self,
        task: impl Into<String>,
        history: Vec<Message>,
    ) -> AgentResult {
        let mut context = ConversationContext::with_history(
            task,
            history,
            self.tool_registry.clone(),
            self.config.clone(),
        );
        self.drive(&mut context, self.event_handler.as_ref()).await;
        context.into_result()
    }

    /// Execute the agent loop with conversation history and a custom event handler
    ///
    /// This method allows passing a per-request event handler for real-time
    /// streaming of tool call events.
    pub async fn run_with_history_and_handler(
        &self,
        task: impl Into<String>,
        history: Vec<Message>,
        handler: Arc<dyn ExecutorEventHandler>,
    ) -> AgentResult {
        let mut context = ConversationContext::with_history(
            task,
            history,
            self.tool_registry.clone(),
            self.config.clone(),
        );
        self.drive(&mut context, Some(&handler)).await;
        context.into_result()
    }

    /// Drive a caller-built context until it completes or fails
    ///
    /// The context's own tools and configuration are used, not the
    /// executor's.
    pub async fn run_context(&self, context: &mut ConversationContext) {
        self.drive(context, self.event_handler.as_ref()).await;
    }

    async fn drive(
        &self,
        context: &mut ConversationContext,
        event_handler: Option<&Arc<dyn ExecutorEventHandler>>,
    ) {
        let max_iterations = context.config().max_iterations;

        while !context.is_terminal() {
            if context.has_reached_max_iterations() {
                let reason = Error::MaxIterationsExceeded(max_iterations).to_string();
                warn!(max_iterations = max_iterations, "Max iterations reached, stopping");
                Self::fail(context, reason, event_handler).await;
                break;
            }
            let iteration = context.increment_iteration();

            info!(
                iteration = iteration,
                max_iterations = max_iterations,
                "Agent iteration started"
            );

            let response = match self.call_model(context).await {
                Ok(response) => response,
                Err(e) => {
                    error!(iteration = iteration, error = %e, "Model call failed");
                    Self::fail(context, e.to_string(), event_handler).await;
                    break;
                }
            };

            context.add_usage(response.usage);

            if let Some(handler) = event_handler {
                handler.on_iteration(iteration, &response, context).await;
            }

            let message = response.to_message().normalize_tool_inputs();
            let calls: Vec<ToolCall> = message
                .tool_uses()
                .into_iter()
                .filter_map(ToolCall::from_block)
                .collect();
            context.add_message(message);

            // Tool uses are answered regardless of stop reason: the API wants a
            // result for every tool_use block, even in a truncated turn.
            if !calls.is_empty() {
                info!(
                    tool_count = calls.len(),
                    stop_reason = ?response.stop_reason,
                    "Agent requested tool use"
                );
                self.execute_tools(context, calls, event_handler).await;
                continue;
            }

            if response.stop_reason.is_natural_completion() {
                let answer = response.text();
                info!(
                    iteration = iteration,
                    response_length = answer.len(),
                    "Agent completed naturally"
                );
                if let Some(handler) = event_handler {
                    handler.on_complete(&answer).await;
                }
                context.complete(answer);
                break;
            }

            warn!(
                stop_reason = ?response.stop_reason,
                "Turn ended without completion or tool use, continuing"
            );
        }
    }

    /// Send the conversation to the model
    async fn call_model(&self, context: &ConversationContext) -> Result<CompletionResponse> {
        let config = context.config();
        let tools = context.tools().definitions();
        debug!(tool_count = tools.len(), "Available tools");

        // Log the message being processed
        if let Some(last_msg) = context.messages().last() {
            let msg_preview: String = last_msg.text().chars().take(200).collect();
            debug!(
                role = ?last_msg.role,
                message_preview = %msg_preview,
                "Processing message"
            );
        }

        info!(
            model = %config.model,
            max_tokens = config.max_tokens,
            temperature = ?config.temperature,
            tool_count = tools.len(),
            "Sending request to LLM"
        );
        let mut request_builder = CompletionRequest::builder(&config.model)
            .messages(context.messages().to_vec())
            .system(
                config
                    .system_prompt
                    .clone()
                    .unwrap_or_else(|| "You are a helpful assistant.".to_string()),
            )
            .max_tokens(config.max_tokens);

        if let Some(temperature) = config.temperature {
            request_builder = request_builder.temperature(temperature);
        }

        // Only add tools if we have any
        if !tools.is_empty() {
            request_builder = request_builder.tools(tools);
        }

        let response = self
            .provider
            .complete(request_builder.build())
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        info!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM response received"
        );

        let response_preview: String = response.text().chars().take(300).collect();
        debug!(
            response_preview = %response_preview,
            "LLM response content preview"
        );

        Ok(response)
    }

    /// Run one turn's tool calls and append their results as one user message
    async fn execute_tools(
        &self,
        context: &mut ConversationContext,
        calls: Vec<ToolCall>,
        event_handler: Option<&Arc<dyn ExecutorEventHandler>>,
    ) {
        if let Some(handler) = event_handler {
            for call in &calls {
                handler.on_tool_start(&call.id, &call.name, &call.input).await;
            }
        }

        let executor = ParallelToolExecutor::new(context.tools().clone());
        let outcomes: Vec<ToolOutcome> = if let [call] = calls.as_slice() {
            vec![executor.execute_one(call.clone()).await]
        } else {
            executor
                .execute_batched(calls, context.config().tool_concurrency)
                .await
        };

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in &outcomes {
            if let Some(handler) = event_handler {
                handler
                    .on_tool_execution(&outcome.call.name, &outcome.call.input, &outcome.result)
                    .await;
            }
            context.record_tool_call(ToolCallRecord::from(outcome));
            results.push(outcome.result.to_content_block(outcome.call.id.clone()));
        }

        info!(
            result_count = results.len(),
            "Tool execution completed, continuing agent loop"
        );
        context.add_message(Message::tool_results(results));
    }

    async fn fail(
        context: &mut ConversationContext,
        reason: String,
        event_handler: Option<&Arc<dyn ExecutorEventHandler>>,
    ) {
        if let Some(handler) = event_handler {
            handler.on_error(&reason).await;
        }
        context.fail(reason);
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set how many tool calls from one turn run at once
    pub fn tool_concurrency(mut self, concurrency: usize) -> Self {
        self.config.tool_concurrency = concurrency;
        self
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        if self.config.max_iterations == 0 {
            return Err(Error::InitializationFailed(
                "max_iterations must be greater than 0".to_string(),
            ));
        }

        let mut executor = AgentExecutor::new(provider, self.tool_registry, self.config);
        executor.event_handler = self.event_handler;
        Ok(executor)
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
