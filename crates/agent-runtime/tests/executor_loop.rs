//! End-to-end behaviour of the reasoning loop against scripted models

mod common;

use agent_llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message, Role,
    StopReason, TokenUsage,
};
use agent_runtime::{
    AgentExecutor, ConversationContext, ExecutorConfig, ExecutorEventHandler, RunStatus,
};
use agent_tools::ToolResult;
use async_trait::async_trait;
use common::{
    RelentlessProvider, ScriptedProvider, echo, executor, ping, registry, sleeper, text_turn,
    tool_turn,
};
use mockall::mock;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

mock! {
    pub Provider {}

    #[async_trait]
    impl LLMProvider for Provider {
        async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse>;
        fn name(&self) -> &str;
    }
}

/// Records every hook call as a line of text
#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

impl RecordingHandler {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ExecutorEventHandler for RecordingHandler {
    async fn on_iteration(
        &self,
        iteration: usize,
        response: &CompletionResponse,
        context: &ConversationContext,
    ) {
        self.push(format!(
            "iteration {iteration} {:?} usage={}",
            response.stop_reason,
            context.usage().total()
        ));
    }

    async fn on_tool_start(&self, id: &str, name: &str, _input: &Value) {
        self.push(format!("start {id} {name}"));
    }

    async fn on_tool_execution(&self, name: &str, _input: &Value, result: &ToolResult) {
        self.push(format!("tool {name} error={}", result.is_error));
    }

    async fn on_complete(&self, answer: &str) {
        self.push(format!("complete {answer}"));
    }

    async fn on_error(&self, error: &str) {
        self.push(format!("error {error}"));
    }
}

#[tokio::test]
async fn natural_completion_joins_text_blocks() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![CompletionResponse::new(
        vec![ContentBlock::text("Paris"), ContentBlock::text("is the capital.")],
        StopReason::EndTurn,
        TokenUsage::new(12, 4),
    )]);
    let executor = executor(provider.clone(), vec![], ExecutorConfig::default());

    let result = executor.run("Capital of France?").await;

    assert!(result.success);
    assert_eq!(result.answer.as_deref(), Some("Paris\nis the capital."));
    assert_eq!(result.iterations, 1);
    assert_eq!(result.usage, TokenUsage::new(12, 4));
    assert_eq!(result.messages.len(), 2);
    assert_eq!(provider.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn stop_sequence_counts_as_completion() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![CompletionResponse::new(
        vec![ContentBlock::text("done")],
        StopReason::StopSequence,
        TokenUsage::new(1, 1),
    )]);
    let result = executor(provider, vec![], ExecutorConfig::default())
        .run("go")
        .await;

    assert!(result.success);
    assert_eq!(result.answer.as_deref(), Some("done"));
    Ok(())
}

#[tokio::test]
async fn tool_results_follow_tool_use_order() -> anyhow::Result<()> {
    // earlier calls sleep longer, so they finish last
    let calls: Vec<(String, &str, Value)> = (0..4)
        .map(|i| (format!("toolu_{i}"), "sleep", json!({"ms": 40 - i * 10, "tag": format!("t{i}")})))
        .collect();
    let provider = ScriptedProvider::new(vec![tool_turn(calls), text_turn("all done")]);
    let config = ExecutorConfig {
        tool_concurrency: 2,
        ..ExecutorConfig::default()
    };
    let executor = executor(provider.clone(), vec![sleeper()], config);

    let result = executor.run("run the sleepers").await;
    assert!(result.success);
    assert_eq!(result.iterations, 2);

    // user task, assistant tool uses, one user message with every result, final answer
    assert_eq!(result.messages.len(), 4);
    let answers = &result.messages[2];
    assert_eq!(answers.role, Role::User);
    let expected: Vec<ContentBlock> = (0..4)
        .map(|i| ContentBlock::tool_result(format!("toolu_{i}"), format!("t{i}")))
        .collect();
    assert_eq!(answers.content, expected);

    let recorded: Vec<_> = result.tool_calls.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(recorded, vec!["toolu_0", "toolu_1", "toolu_2", "toolu_3"]);

    // the second request carries the whole conversation so far
    let requests = provider.requests();
    assert_eq!(requests[1].messages, result.messages[..3].to_vec());
    Ok(())
}

#[tokio::test]
async fn max_iterations_fails_run() -> anyhow::Result<()> {
    let config = ExecutorConfig {
        max_iterations: 2,
        ..ExecutorConfig::default()
    };
    let executor = executor(Arc::new(RelentlessProvider), vec![ping()], config);

    let result = executor.run("ping forever").await;

    assert!(!result.success);
    assert_eq!(result.iterations, 2);
    assert!(result.error.as_deref().is_some_and(|e| e.contains("Maximum iterations")));
    assert_eq!(result.tool_calls.len(), 2);
    assert!(result.answer.is_none());
    Ok(())
}

#[tokio::test]
async fn transport_failure_fails_run() -> anyhow::Result<()> {
    let mut provider = MockProvider::new();
    provider
        .expect_complete()
        .times(1)
        .returning(|_| Err(LLMError::RateLimitExceeded("slow down".to_string())));

    let handler = Arc::new(RecordingHandler::default());
    let executor = executor(Arc::new(provider), vec![], ExecutorConfig::default())
        .with_event_handler(handler.clone());

    let result = executor.run("hello").await;

    assert!(!result.success);
    assert_eq!(result.iterations, 1);
    assert_eq!(
        result.error.as_deref(),
        Some("Transport error: Rate limit exceeded: slow down")
    );
    assert_eq!(result.messages, vec![Message::user("hello")]);
    assert_eq!(
        handler.events(),
        vec!["error Transport error: Rate limit exceeded: slow down"]
    );
    Ok(())
}

#[tokio::test]
async fn truncated_turn_gets_another_iteration() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![
        CompletionResponse::new(
            vec![ContentBlock::text("The answer is")],
            StopReason::MaxTokens,
            TokenUsage::new(10, 100),
        ),
        text_turn("42"),
    ]);
    let executor = executor(provider.clone(), vec![], ExecutorConfig::default());

    let result = executor.run("Answer at length").await;

    assert!(result.success);
    assert_eq!(result.answer.as_deref(), Some("42"));
    assert_eq!(result.iterations, 2);
    assert_eq!(result.usage, TokenUsage::new(20, 105));
    // the truncated text stays in the log
    assert_eq!(result.messages[1], Message::assistant("The answer is"));
    Ok(())
}

#[tokio::test]
async fn tool_use_answered_even_when_truncated() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![
        CompletionResponse::new(
            vec![ContentBlock::tool_use("toolu_1", "ping", json!({}))],
            StopReason::MaxTokens,
            TokenUsage::new(5, 5),
        ),
        text_turn("pong received"),
    ]);
    let result = executor(provider, vec![ping()], ExecutorConfig::default())
        .run("ping once")
        .await;

    assert!(result.success);
    assert_eq!(
        result.messages[2].content,
        vec![ContentBlock::tool_result("toolu_1", "pong")]
    );
    Ok(())
}

#[tokio::test]
async fn empty_tool_input_becomes_object() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![
        tool_turn(vec![
            ("toolu_a".to_string(), "echo", Value::Null),
            ("toolu_b".to_string(), "echo", json!([])),
        ]),
        text_turn("ok"),
    ]);
    let executor = executor(provider.clone(), vec![echo()], ExecutorConfig::default());

    let result = executor.run("echo nothing").await;
    assert!(result.success);

    // the logged assistant turn and the tool both saw `{}`
    for block in result.messages[1].tool_uses() {
        let ContentBlock::ToolUse { input, .. } = block else {
            unreachable!()
        };
        assert_eq!(input, &json!({}));
    }
    assert!(result.tool_calls.iter().all(|c| c.output == json!({})));
    assert_eq!(
        result.messages[2].content,
        vec![
            ContentBlock::tool_result("toolu_a", "{}"),
            ContentBlock::tool_result("toolu_b", "{}"),
        ]
    );

    let sent = serde_json::to_value(&provider.requests()[1].messages[1])?;
    assert_eq!(sent["content"][0]["input"], json!({}));
    Ok(())
}

#[tokio::test]
async fn unknown_tool_reported_to_model() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![
        tool_turn(vec![
            ("toolu_1".to_string(), "teleport", json!({"to": "mars"})),
            ("toolu_2".to_string(), "ping", json!({})),
        ]),
        text_turn("could not teleport"),
    ]);
    let result = executor(provider, vec![ping()], ExecutorConfig::default())
        .run("go to mars")
        .await;

    assert!(result.success);
    assert_eq!(
        result.messages[2].content,
        vec![
            ContentBlock::tool_error("toolu_1", "Tool not found: teleport"),
            ContentBlock::tool_result("toolu_2", "pong"),
        ]
    );
    assert!(result.tool_calls[0].is_error);
    assert!(!result.tool_calls[1].is_error);
    Ok(())
}

#[tokio::test]
async fn hooks_observe_without_steering() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![
        tool_turn(vec![("toolu_1".to_string(), "ping", json!({}))]),
        text_turn("finished"),
    ]);
    let handler = Arc::new(RecordingHandler::default());
    let executor = executor(provider, vec![ping()], ExecutorConfig::default());

    let result = executor
        .run_with_history_and_handler("ping", Vec::new(), handler.clone())
        .await;

    assert!(result.success);
    assert_eq!(
        handler.events(),
        vec![
            "iteration 1 ToolUse usage=30",
            "start toolu_1 ping",
            "tool ping error=false",
            "iteration 2 EndTurn usage=45",
            "complete finished",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn history_precedes_task_in_first_request() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![text_turn("Your name is Ada.")]);
    let executor = executor(provider.clone(), vec![ping()], ExecutorConfig::default());
    let history = vec![
        Message::user("My name is Ada."),
        Message::assistant("Nice to meet you, Ada."),
    ];

    let result = executor.run_with_history("What is my name?", history).await;
    assert!(result.success);

    let request = &provider.requests()[0];
    assert_eq!(request.messages.len(), 3);
    assert_eq!(request.messages[2], Message::user("What is my name?"));
    let tools: Vec<_> = request
        .tools
        .as_ref()
        .map(|defs| defs.iter().map(|d| d.name.clone()).collect())
        .unwrap_or_default();
    assert_eq!(tools, vec!["ping"]);
    Ok(())
}

#[tokio::test]
async fn run_context_uses_context_settings() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![text_turn("fine")]);
    let executor = AgentExecutor::builder()
        .provider(provider.clone())
        .model("executor-model")
        .build()?;

    let config = ExecutorConfig {
        model: "context-model".to_string(),
        ..ExecutorConfig::default()
    };
    let mut context = ConversationContext::new("how are you?", registry(vec![]), config);
    executor.run_context(&mut context).await;

    assert_eq!(context.status(), RunStatus::Completed);
    assert_eq!(context.answer(), Some("fine"));
    assert_eq!(provider.requests()[0].model, "context-model");
    assert!(provider.requests()[0].tools.is_none());
    Ok(())
}
