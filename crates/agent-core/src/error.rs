//! Error types for agent-core

use std::time::Duration;
use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
///
/// The type is `Clone` because a rejected [`Promise`](crate::Promise) hands
/// the same error to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// A tool handler returned a failure or panicked
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution {
        /// Name of the failing tool
        tool: String,
        /// Failure reason reported by the handler
        message: String,
    },

    /// The requested tool is not registered
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// A tool with this name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// Calling the model client failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The iteration budget ran out before the run completed
    #[error("Maximum iterations ({0}) reached without completion")]
    MaxIterationsExceeded(usize),

    /// Waiting on a promise took longer than the caller allowed
    #[error("Timed out after {0:?} waiting for result")]
    Timeout(Duration),

    /// `race` was called with no promises
    #[error("Cannot race an empty set of promises")]
    EmptyRace,
}
