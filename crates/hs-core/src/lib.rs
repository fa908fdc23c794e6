//! Core configuration for the hsstats client.
//!
//! This crate provides:
//! - `ClientConfig` - Top-level client configuration
//! - `RetryConfig` - Polling policy for queries the server is still computing
//! - `FragmentConfig` - Debounce and default-handling for URL fragment state
//! - `ConfigError` - Configuration loading errors

mod config;
mod error;

pub use config::*;
pub use error::*;
