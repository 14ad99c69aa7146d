//! Closure-backed tools

use crate::Tool;
use agent_core::Result;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;

type Handler = dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// A [`Tool`] whose behaviour is an async closure
///
/// # Example
///
/// ```
/// use agent_tools::{FunctionTool, Tool};
/// use agent_llm::tools::schema;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let echo = FunctionTool::new(
///     "echo",
///     "Echo the text back",
///     schema::object(json!({"text": schema::string("Text to echo")}), vec!["text"]),
///     |input| async move { Ok(input["text"].clone()) },
/// );
///
/// let out = echo.execute(json!({"text": "hi"})).await.unwrap();
/// assert_eq!(out, json!("hi"));
/// # });
/// ```
pub struct FunctionTool {
    name: String,
    description: String,
    input_schema: Value,
    handler: Box<Handler>,
}

impl FunctionTool {
    /// Create a tool from a name, description, schema and handler
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Box::new(move |input| handler(input).boxed()),
        }
    }
}

impl fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FunctionTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        (self.handler)(params).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }
}
