//! Observability for the hsstats client core.
//!
//! This crate provides:
//! - `CacheCounters` / `CacheStats` - Request cache hit/miss accounting
//! - `MetricsCollector` - Per-query polling outcomes
//! - `init_tracing` - Subscriber setup for binaries

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
