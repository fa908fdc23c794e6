//! Request cache/coordinator for the analytics API.
//!
//! This crate provides:
//! - `CacheKey` - Order-independent identifier for an (endpoint, params) pair
//! - `RequestCache` - Coalesces in-flight requests and memoizes successes
//! - `DataInjector` - Polls queries the server is still computing
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use hs_cache::{DataInjector, RequestCache};
//! use hs_data::{DefaultSleep, Endpoint, HttpTransport, QueryParams};
//!
//! let cache = Rc::new(RequestCache::new(HttpTransport::new()?));
//! let injector = DataInjector::new(cache, DefaultSleep::default());
//!
//! let params = QueryParams::new().with("GameType", "RANKED_STANDARD");
//! let outcome = injector.load(&Endpoint::query("list_decks_by_win_rate"), &params).await;
//! ```

mod cache;
mod injector;
mod key;

pub use cache::*;
pub use injector::*;
pub use key::*;

pub use hs_observability::CacheStats;
