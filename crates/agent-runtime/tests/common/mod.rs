//! Shared fixtures for runtime integration tests

#![allow(dead_code)]

use agent_llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, StopReason,
    TokenUsage,
};
use agent_runtime::{AgentExecutor, ExecutorConfig};
use agent_tools::{FunctionTool, Tool, ToolRegistry};
use agent_llm::tools::schema;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays canned responses in order and records every request
pub struct ScriptedProvider {
    script: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<CompletionResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::UnexpectedResponse("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Calls `ping` on every turn, forever
pub struct RelentlessProvider;

#[async_trait]
impl LLMProvider for RelentlessProvider {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        let turn = request.messages.len();
        Ok(tool_turn(vec![(format!("toolu_{turn}"), "ping", json!({}))]))
    }

    fn name(&self) -> &str {
        "relentless"
    }
}

/// Answers each task deterministically from its text
///
/// The answer is the task upper-cased and usage is 100/200 tokens. Tasks
/// starting with "fail" get a transport error. Shorter tasks take longer so
/// completion order differs from submission order.
pub struct TaskProvider;

#[async_trait]
impl LLMProvider for TaskProvider {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        let task = request
            .messages
            .last()
            .map(agent_llm::Message::text)
            .unwrap_or_default();
        let delay = 40_u64.saturating_sub(task.len() as u64 * 2);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if task.starts_with("fail") {
            return Err(LLMError::RequestFailed("upstream unavailable".to_string()));
        }
        Ok(CompletionResponse::new(
            vec![ContentBlock::text(task.to_uppercase())],
            StopReason::EndTurn,
            TokenUsage::new(100, 200),
        ))
    }

    fn name(&self) -> &str {
        "task"
    }
}

pub fn text_turn(text: &str) -> CompletionResponse {
    CompletionResponse::new(
        vec![ContentBlock::text(text)],
        StopReason::EndTurn,
        TokenUsage::new(10, 5),
    )
}

pub fn tool_turn(calls: Vec<(String, &str, Value)>) -> CompletionResponse {
    CompletionResponse::new(
        calls
            .into_iter()
            .map(|(id, name, input)| ContentBlock::tool_use(id, name, input))
            .collect(),
        StopReason::ToolUse,
        TokenUsage::new(20, 10),
    )
}

/// Sleeps `input.ms` then returns `input.tag`
pub fn sleeper() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::new(
        "sleep",
        "Sleep then echo a tag",
        schema::object(
            json!({"ms": schema::integer("Delay"), "tag": schema::string("Tag")}),
            vec!["ms", "tag"],
        ),
        |input| async move {
            let ms = input["ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(input["tag"].clone())
        },
    ))
}

/// Returns its input unchanged
pub fn echo() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::new("echo", "Echo the input", schema::empty(), |input| async move {
        Ok(input)
    }))
}

pub fn ping() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::new("ping", "Ping", schema::empty(), |_| async {
        Ok(json!("pong"))
    }))
}

pub fn registry(tools: Vec<Arc<dyn Tool>>) -> Arc<ToolRegistry> {
    let registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool).unwrap();
    }
    Arc::new(registry)
}

pub fn executor(
    provider: Arc<dyn LLMProvider>,
    tools: Vec<Arc<dyn Tool>>,
    config: ExecutorConfig,
) -> AgentExecutor {
    let _ = agent_utils::try_init_tracing();
    AgentExecutor::new(provider, registry(tools), config)
}
