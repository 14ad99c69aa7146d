//! Shared utilities for agent-rs
//!
//! This crate provides common functionality used across the agent-rs workspace,
//! including logging setup and configuration loading.

pub mod config;
pub mod logging;

pub use config::{ConfigError, Settings};
pub use logging::{init_tracing, try_init_tracing};
