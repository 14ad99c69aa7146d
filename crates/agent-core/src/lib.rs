//! Core primitives for agent-rs
//!
//! This crate defines the error taxonomy shared across the agent-rs framework,
//! the single-assignment [`Promise`] used to hand results between concurrent
//! tasks, and the bounded-window executor that both tool batches and agent
//! batches run on.

pub mod error;
pub mod promise;
pub mod window;

pub use error::{Error, Result};
pub use promise::{Promise, PromiseState};
pub use window::run_bounded;
