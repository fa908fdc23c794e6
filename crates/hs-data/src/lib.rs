//! HTTP boundary for the analytics API.
//!
//! This crate provides:
//! - `Endpoint` / `QueryParams` - What to fetch and with which parameters
//! - `Transport` - The network seam, implemented by `HttpTransport`
//! - `Response` / `FetchError` - Outcomes of a single request
//! - `RetryPolicy` - Polling strategy for queries the server is still computing
//! - `Sleep` - Timer seam used between polling attempts

mod endpoint;
mod error;
mod http_transport;
mod response;
mod retry;
mod timer;
mod transport;

pub use endpoint::*;
pub use error::FetchError;
pub use http_transport::HttpTransport;
pub use response::Response;
pub use retry::*;
pub use timer::*;
pub use transport::Transport;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Endpoint, FetchError, QueryParams, Response, RetryPolicy, Sleep, Transport};
}
