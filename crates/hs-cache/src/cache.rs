//! Request cache with in-flight coalescing.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use futures::future::{self, LocalBoxFuture, Shared};
use futures::FutureExt;
use hs_core::ClientConfig;
use hs_data::{Endpoint, FetchError, QueryParams, Transport};
use hs_observability::{CacheCounters, CacheStats};
use serde_json::Value;

use crate::key::{gen_cache_key, CacheKey};

/// Result every caller of a cached request observes.
pub type FetchResult = Result<Rc<Value>, FetchError>;

/// A cloneable handle on a cached or in-flight request.
pub type Fetch = Shared<LocalBoxFuture<'static, FetchResult>>;

/// State of one cache key. Failures are never stored.
enum Entry {
    Pending(Fetch),
    Resolved(Rc<Value>),
}

type Entries = RefCell<HashMap<CacheKey, Entry>>;

/// Process-local cache of JSON responses.
///
/// At most one request per key is in flight; every concurrent caller gets a
/// clone of the same shared future. Successful responses are kept for the
/// lifetime of the cache, failures (including 202 "still processing") are
/// dropped so the next call issues a fresh request.
///
/// Not `Send`: one cache serves one single-threaded event loop.
pub struct RequestCache<T> {
    transport: Rc<T>,
    analytics_base: String,
    entries: Rc<Entries>,
    counters: Rc<CacheCounters>,
}

impl<T: Transport + 'static> RequestCache<T> {
    /// Create a cache with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &ClientConfig::default())
    }

    /// Create a cache using the analytics base path from `config`.
    pub fn with_config(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport: Rc::new(transport),
            analytics_base: config.analytics_base.clone(),
            entries: Rc::new(RefCell::new(HashMap::new())),
            counters: Rc::new(CacheCounters::new()),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request URL for an endpoint and its parameters.
    pub fn url_for(&self, endpoint: &Endpoint, params: &QueryParams) -> String {
        endpoint.url(&self.analytics_base, params)
    }

    /// Cache key for an endpoint and its parameters.
    pub fn key_for(&self, endpoint: &Endpoint, params: &QueryParams) -> CacheKey {
        gen_cache_key(&endpoint.resolve(&self.analytics_base), params)
    }

    /// Whether a successful response is already cached.
    pub fn has(&self, endpoint: &Endpoint, params: &QueryParams) -> bool {
        self.peek(endpoint, params).is_some()
    }

    /// The cached response, if one has resolved.
    pub fn peek(&self, endpoint: &Endpoint, params: &QueryParams) -> Option<Rc<Value>> {
        let key = self.key_for(endpoint, params);
        match self.entries.borrow().get(&key) {
            Some(Entry::Resolved(value)) => Some(Rc::clone(value)),
            _ => None,
        }
    }

    /// Whether a request for this key is in flight.
    pub fn is_pending(&self, endpoint: &Endpoint, params: &QueryParams) -> bool {
        let key = self.key_for(endpoint, params);
        matches!(self.entries.borrow().get(&key), Some(Entry::Pending(_)))
    }

    /// Fetch JSON through the cache.
    ///
    /// Resolved keys answer immediately, pending keys hand out the in-flight
    /// future, unseen keys start a request.
    pub fn get(&self, endpoint: &Endpoint, params: &QueryParams) -> Fetch {
        let key = self.key_for(endpoint, params);

        if let Some(existing) = self.lookup(&key) {
            return existing;
        }

        let url = self.url_for(endpoint, params);
        tracing::debug!(key = %key, url = %url, "cache miss");
        self.counters.record_request();

        let fetch = request(
            Rc::clone(&self.transport),
            url,
            key.clone(),
            Rc::downgrade(&self.entries),
            Rc::clone(&self.counters),
        )
        .boxed_local()
        .shared();

        self.entries
            .borrow_mut()
            .insert(key, Entry::Pending(fetch.clone()));
        fetch
    }

    fn lookup(&self, key: &CacheKey) -> Option<Fetch> {
        match self.entries.borrow().get(key)? {
            Entry::Resolved(value) => {
                tracing::trace!(key = %key, "cache hit");
                self.counters.record_hit();
                let value = Rc::clone(value);
                Some(future::ready(Ok(value)).boxed_local().shared())
            }
            Entry::Pending(fetch) => {
                tracing::trace!(key = %key, "joining in-flight request");
                self.counters.record_coalesced();
                Some(fetch.clone())
            }
        }
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|e| matches!(e, Entry::Resolved(_)))
            .count()
    }

    /// Whether no entry has resolved yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters for hits, misses and coalesced calls.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

async fn request<T: Transport + ?Sized>(
    transport: Rc<T>,
    url: String,
    key: CacheKey,
    entries: Weak<Entries>,
    counters: Rc<CacheCounters>,
) -> FetchResult {
    let result = fetch_json(&*transport, &url).await;

    if let Some(entries) = entries.upgrade() {
        let mut entries = entries.borrow_mut();
        match &result {
            Ok(value) => {
                entries.insert(key, Entry::Resolved(Rc::clone(value)));
            }
            Err(_) => {
                entries.remove(&key);
            }
        }
    }

    match &result {
        Ok(_) => {}
        Err(FetchError::Processing) => {
            counters.record_failure();
            tracing::debug!(url = %url, "query still processing");
        }
        Err(err) => {
            counters.record_failure();
            tracing::warn!(url = %url, error = %err, "request failed");
        }
    }

    result
}

async fn fetch_json<T: Transport + ?Sized>(transport: &T, url: &str) -> FetchResult {
    let response = transport.get(url).await?.error_for_status(url)?;
    let value: Value = response.json()?;
    Ok(Rc::new(value))
}
