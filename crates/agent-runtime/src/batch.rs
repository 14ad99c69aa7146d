//! Batch execution of independent agent runs
//!
//! A [`BatchRunner`] queues named tasks and runs each one through the shared
//! [`AgentExecutor`] with a bounded window of runs in flight. Every run owns
//! its own conversation; nothing mutable is shared between them.

use crate::executor::AgentExecutor;
use crate::result::AgentResult;
use agent_core::{Promise, run_bounded};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default number of runs in flight
pub const DEFAULT_BATCH_CONCURRENCY: usize = 5;

/// A queued task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTask {
    /// Unique key within the batch
    pub key: String,
    /// Task text handed to the agent
    pub input: String,
}

/// Token totals across a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTotals {
    /// Input tokens
    pub input: usize,
    /// Output tokens
    pub output: usize,
    /// Input + output
    pub total: usize,
}

/// Aggregate statistics for the last run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Tasks with a result
    pub total_requests: usize,
    /// Tasks that completed
    pub successful: usize,
    /// Tasks that failed
    pub failed: usize,
    /// `successful / total_requests`, zero for an empty batch
    pub success_rate: f64,
    /// Usage summed over every task, failed ones included
    pub total_tokens: TokenTotals,
}

/// Runs many agent tasks concurrently
///
/// # Example
///
/// ```no_run
/// # async fn demo(executor: std::sync::Arc<agent_runtime::AgentExecutor>) {
/// use agent_runtime::BatchRunner;
///
/// let mut batch = BatchRunner::new(executor);
/// batch.add("capital", "What is the capital of France?");
/// batch.add("sum", "What is 2 + 2?");
///
/// batch.run(2).await;
/// let stats = batch.stats();
/// println!("{}/{} succeeded", stats.successful, stats.total_requests);
/// # }
/// ```
pub struct BatchRunner {
    executor: Arc<AgentExecutor>,
    tasks: Vec<BatchTask>,
    results: BTreeMap<String, AgentResult>,
    concurrency: usize,
}

impl BatchRunner {
    /// Create a runner over a shared executor
    pub fn new(executor: Arc<AgentExecutor>) -> Self {
        Self {
            executor,
            tasks: Vec::new(),
            results: BTreeMap::new(),
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Set the window used by [`run_all`](Self::run_all) and [`run_async`](Self::run_async)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Queue a task
    ///
    /// Re-adding a key replaces that task's input and keeps its place in the
    /// queue.
    pub fn add(&mut self, key: impl Into<String>, input: impl Into<String>) -> &mut Self {
        let key = key.into();
        let input = input.into();
        if let Some(task) = self.tasks.iter_mut().find(|task| task.key == key) {
            debug!(key = %key, "Replacing queued task input");
            task.input = input;
        } else {
            self.tasks.push(BatchTask { key, input });
        }
        self
    }

    /// Queue several tasks
    pub fn add_many<I, K, V>(&mut self, tasks: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, input) in tasks {
            self.add(key, input);
        }
        self
    }

    /// Queued tasks, in the order they were added
    pub fn tasks(&self) -> &[BatchTask] {
        &self.tasks
    }

    /// Run every queued task with at most `concurrency` in flight
    ///
    /// Replaces the stored results with this run's. A task whose run panics
    /// gets a failed result; the rest of the batch carries on.
    pub async fn run(&mut self, concurrency: usize) -> &BTreeMap<String, AgentResult> {
        info!(
            task_count = self.tasks.len(),
            concurrency = concurrency,
            "Starting batch"
        );
        let start_time = Instant::now();

        let executor = &self.executor;
        let outputs = run_bounded(self.tasks.iter().cloned(), concurrency, |task| async move {
            let result = run_task(executor, &task).await;
            (task.key, result)
        })
        .await;

        self.results = outputs.into_iter().collect();

        let stats = self.stats();
        info!(
            successful = stats.successful,
            failed = stats.failed,
            total_tokens = stats.total_tokens.total,
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Batch completed"
        );
        &self.results
    }

    /// Run with the configured window
    pub async fn run_all(&mut self) -> &BTreeMap<String, AgentResult> {
        let concurrency = self.concurrency;
        self.run(concurrency).await
    }

    /// Start every queued task in the background and return a promise per key
    ///
    /// The same window applies as for [`run_all`](Self::run_all). Results
    /// delivered this way are not stored on the runner, so they do not show
    /// up in [`successful`](Self::successful), [`failed`](Self::failed) or
    /// [`stats`](Self::stats). Must be called from within a tokio runtime.
    pub fn run_async(&self) -> BTreeMap<String, Promise<AgentResult>> {
        let pending: Vec<(BatchTask, Promise<AgentResult>)> = self
            .tasks
            .iter()
            .map(|task| (task.clone(), Promise::new()))
            .collect();
        let promises = pending
            .iter()
            .map(|(task, promise)| (task.key.clone(), promise.clone()))
            .collect();

        let executor = Arc::clone(&self.executor);
        let concurrency = self.concurrency;
        info!(
            task_count = pending.len(),
            concurrency = concurrency,
            "Starting batch in background"
        );
        tokio::spawn(async move {
            let executor = &executor;
            run_bounded(pending, concurrency, |(task, promise)| async move {
                let result = run_task(executor, &task).await;
                promise.resolve(result);
            })
            .await;
        });

        promises
    }

    /// Results of the last run, by key
    pub fn results(&self) -> &BTreeMap<String, AgentResult> {
        &self.results
    }

    /// Results of the last run that completed
    pub fn successful(&self) -> BTreeMap<&str, &AgentResult> {
        self.partition(true)
    }

    /// Results of the last run that failed
    pub fn failed(&self) -> BTreeMap<&str, &AgentResult> {
        self.partition(false)
    }

    fn partition(&self, success: bool) -> BTreeMap<&str, &AgentResult> {
        self.results
            .iter()
            .filter(|(_, result)| result.success == success)
            .map(|(key, result)| (key.as_str(), result))
            .collect()
    }

    /// Aggregate counts and token usage for the last run
    pub fn stats(&self) -> BatchStats {
        let total_requests = self.results.len();
        let successful = self.results.values().filter(|r| r.success).count();

        let mut total_tokens = TokenTotals::default();
        for result in self.results.values() {
            total_tokens.input += result.usage.input_tokens;
            total_tokens.output += result.usage.output_tokens;
        }
        total_tokens.total = total_tokens.input + total_tokens.output;

        BatchStats {
            total_requests,
            successful,
            failed: total_requests - successful,
            success_rate: if total_requests == 0 {
                0.0
            } else {
                successful as f64 / total_requests as f64
            },
            total_tokens,
        }
    }

    /// Clear stored results; queued tasks stay
    pub fn reset(&mut self) {
        self.results.clear();
    }
}

async fn run_task(executor: &AgentExecutor, task: &BatchTask) -> AgentResult {
    debug!(key = %task.key, "Batch task started");
    match AssertUnwindSafe(executor.run(task.input.as_str()))
        .catch_unwind()
        .await
    {
        Ok(result) => {
            debug!(key = %task.key, success = result.success, "Batch task finished");
            result
        }
        Err(_) => {
            warn!(key = %task.key, "Batch task panicked");
            AgentResult::failure(format!("Task '{}' panicked", task.key))
        }
    }
}
