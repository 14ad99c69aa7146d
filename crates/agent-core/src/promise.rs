//! Single-assignment promises
//!
//! A [`Promise`] is settled at most once: the first `resolve` or `reject`
//! wins and every later call is ignored. Any number of clones can wait on
//! the same promise; each waiter receives a clone of the settled value or
//! error.
//!
//! # Example
//!
//! ```
//! use agent_core::Promise;
//!
//! # tokio_test::block_on(async {
//! let promise = Promise::new();
//! assert!(promise.resolve(42));
//! assert!(!promise.resolve(7));
//!
//! assert_eq!(promise.wait().await, Ok(42));
//! # });
//! ```

use crate::{Error, Result};
use futures::future;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Observable state of a [`Promise`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromiseState<T> {
    /// Not settled yet
    Pending,
    /// Settled with a value
    Resolved(T),
    /// Settled with an error
    Rejected(Error),
}

impl<T> PromiseState<T> {
    /// Whether the promise is still waiting to be settled
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl<T: Clone> PromiseState<T> {
    fn outcome(&self) -> Option<Result<T>> {
        match self {
            Self::Pending => None,
            Self::Resolved(value) => Some(Ok(value.clone())),
            Self::Rejected(error) => Some(Err(error.clone())),
        }
    }
}

/// A value container that can be settled exactly once
pub struct Promise<T> {
    state: Arc<watch::Sender<PromiseState<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        let (state, _) = watch::channel(PromiseState::Pending);
        Self {
            state: Arc::new(state),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl<T> Promise<T> {
    /// Create a pending promise
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a promise that is already resolved
    pub fn resolved(value: T) -> Self {
        let promise = Self::new();
        promise.resolve(value);
        promise
    }

    /// Create a promise that is already rejected
    pub fn rejected(error: Error) -> Self {
        let promise = Self::new();
        promise.reject(error);
        promise
    }

    /// Settle the promise with a value
    ///
    /// Returns `true` if this call settled the promise, `false` if it was
    /// already settled (in which case the value is dropped).
    pub fn resolve(&self, value: T) -> bool {
        self.settle(PromiseState::Resolved(value))
    }

    /// Settle the promise with an error
    ///
    /// Returns `true` if this call settled the promise, `false` if it was
    /// already settled.
    pub fn reject(&self, error: Error) -> bool {
        self.settle(PromiseState::Rejected(error))
    }

    fn settle(&self, next: PromiseState<T>) -> bool {
        let mut next = Some(next);
        let settled = self.state.send_if_modified(|current| {
            if current.is_pending() {
                if let Some(next) = next.take() {
                    *current = next;
                }
                true
            } else {
                false
            }
        });
        if !settled {
            debug!("Ignoring settle on an already settled promise");
        }
        settled
    }

    /// Whether the promise is still pending
    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    /// Whether the promise has been resolved or rejected
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }
}

impl<T: Clone> Promise<T> {
    /// Snapshot of the current state
    pub fn state(&self) -> PromiseState<T> {
        self.state.borrow().clone()
    }

    /// The settled outcome, or `None` while pending
    ///
    /// Does not wait. A rejected promise yields `Some(Err(..))`.
    pub fn get_result(&self) -> Option<Result<T>> {
        self.state.borrow().outcome()
    }

    /// Wait until the promise is settled
    ///
    /// Returns the resolved value, or the rejection error.
    pub async fn wait(&self) -> Result<T> {
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(|state| !state.is_pending())
            .await
            .map_err(|e| Error::ProcessingFailed(format!("Promise channel closed: {e}")))?;
        match settled.outcome() {
            Some(outcome) => outcome,
            None => Err(Error::ProcessingFailed(
                "Promise observed while pending".to_string(),
            )),
        }
    }

    /// Wait until the promise is settled, giving up after `timeout`
    ///
    /// The timeout only bounds this caller's wait. Whatever is going to
    /// settle the promise keeps running.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<T> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run a future on the tokio runtime and settle a promise with its output
    ///
    /// A panic inside the future rejects the promise instead of propagating.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let promise = Self::new();
        let settle = promise.clone();
        let task = tokio::spawn(future);
        tokio::spawn(async move {
            match task.await {
                Ok(Ok(value)) => settle.resolve(value),
                Ok(Err(error)) => settle.reject(error),
                Err(join_error) => settle.reject(Error::ProcessingFailed(format!(
                    "Task panicked: {join_error}"
                ))),
            };
        });
        promise
    }

    /// Map the resolved value once it settles
    ///
    /// Rejections pass through unchanged. The callback runs on a spawned task,
    /// so it is not ordered with respect to the caller.
    pub fn then<U, F>(&self, f: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let source = self.clone();
        Promise::spawn(async move { source.wait().await.map(f) })
    }

    /// Recover from a rejection once it settles
    pub fn catch<F>(&self, f: F) -> Promise<T>
    where
        F: FnOnce(Error) -> T + Send + 'static,
    {
        let source = self.clone();
        Promise::spawn(async move { Ok(source.wait().await.unwrap_or_else(f)) })
    }

    /// Wait for every promise to resolve
    ///
    /// Values come back in input order. The first rejection observed fails the
    /// whole call without waiting for the rest.
    pub async fn all<I>(promises: I) -> Result<Vec<T>>
    where
        I: IntoIterator<Item = Promise<T>>,
    {
        future::try_join_all(
            promises
                .into_iter()
                .map(|promise| async move { promise.wait().await }),
        )
        .await
    }

    /// Settle with whichever promise settles first, value or error
    pub async fn race<I>(promises: I) -> Result<T>
    where
        I: IntoIterator<Item = Promise<T>>,
    {
        let waits: Vec<_> = promises
            .into_iter()
            .map(|promise| Box::pin(async move { promise.wait().await }))
            .collect();
        if waits.is_empty() {
            return Err(Error::EmptyRace);
        }
        let (first, _, _) = future::select_all(waits).await;
        first
    }

    /// Wait for every promise to settle
    ///
    /// Never fails: each slot holds that promise's value or its error, in
    /// input order.
    pub async fn all_settled<I>(promises: I) -> Vec<Result<T>>
    where
        I: IntoIterator<Item = Promise<T>>,
    {
        future::join_all(
            promises
                .into_iter()
                .map(|promise| async move { promise.wait().await }),
        )
        .await
    }
}
