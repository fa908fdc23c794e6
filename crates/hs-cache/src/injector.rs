//! Polling layer over the request cache.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use futures::future::join_all;
use hs_data::{DefaultSleep, Endpoint, FetchError, QueryParams, RetryPolicy, Sleep, Transport};
use hs_observability::{MetricsCollector, QueryMetrics, QueryResult};
use serde::Serialize;
use serde_json::Value;

use crate::cache::RequestCache;

/// Render state of a query, as consumers map it to loading/processing/no-data/error UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Nothing cached yet, request not answered.
    Loading,
    /// The server is still computing the query; polling continues.
    Processing,
    /// Data is available.
    Success,
    /// The request succeeded but carried no data.
    NoData,
    /// The retry budget ran out while the server was still computing.
    Timeout,
    /// The request failed.
    Error,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Processing => write!(f, "processing"),
            Self::Success => write!(f, "success"),
            Self::NoData => write!(f, "no_data"),
            Self::Timeout => write!(f, "timeout"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Terminal result of loading a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The response payload.
    Ready(Rc<Value>),
    /// The server kept answering 202 until the retry budget was exhausted.
    Timeout,
    /// A non-retryable failure.
    Error(FetchError),
}

impl QueryOutcome {
    /// Map to a render state.
    pub fn status(&self) -> LoadStatus {
        match self {
            Self::Ready(value) if is_empty_payload(value) => LoadStatus::NoData,
            Self::Ready(_) => LoadStatus::Success,
            Self::Timeout => LoadStatus::Timeout,
            Self::Error(_) => LoadStatus::Error,
        }
    }

    /// The payload, if ready.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Whether a payload carries nothing to render: `null`, `{}`, or an empty `series.data`.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) if map.is_empty() => true,
        Value::Object(map) => match map.get("series").and_then(|s| s.get("data")) {
            Some(Value::Array(items)) => items.is_empty(),
            Some(Value::Object(items)) => items.is_empty(),
            Some(Value::Null) => true,
            _ => false,
        },
        _ => false,
    }
}

/// A named query for `load_many`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedQuery {
    /// Name the outcome is reported under.
    pub name: String,
    pub endpoint: Endpoint,
    pub params: QueryParams,
}

impl NamedQuery {
    /// Create a named query.
    pub fn new(name: impl Into<String>, endpoint: impl Into<Endpoint>, params: QueryParams) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            params,
        }
    }
}

/// Resolves data declarations against a shared `RequestCache`.
///
/// A 202 answer is retried after the policy's delay until the retry budget
/// is spent, then reported as `Timeout`. Any other failure is returned
/// immediately.
pub struct DataInjector<T, S = DefaultSleep> {
    cache: Rc<RequestCache<T>>,
    sleeper: S,
    policy: RetryPolicy,
    metrics: Option<Rc<MetricsCollector>>,
}

impl<T: Transport + 'static, S: Sleep> DataInjector<T, S> {
    /// Create an injector with the default polling policy.
    pub fn new(cache: Rc<RequestCache<T>>, sleeper: S) -> Self {
        Self {
            cache,
            sleeper,
            policy: RetryPolicy::default(),
            metrics: None,
        }
    }

    /// Set the polling policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Record per-query metrics into `metrics`.
    pub fn with_metrics(mut self, metrics: Rc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The shared cache.
    pub fn cache(&self) -> &RequestCache<T> {
        &self.cache
    }

    /// Status to render before `load` completes.
    pub fn initial_status(&self, endpoint: &Endpoint, params: &QueryParams) -> LoadStatus {
        match self.cache.peek(endpoint, params) {
            Some(value) if is_empty_payload(&value) => LoadStatus::NoData,
            Some(_) => LoadStatus::Success,
            None => LoadStatus::Loading,
        }
    }

    /// Load a query, polling while the server is still computing it.
    pub async fn load(&self, endpoint: &Endpoint, params: &QueryParams) -> QueryOutcome {
        self.load_with(endpoint, params, |_| {}).await
    }

    /// Like `load`, reporting `Processing` to `on_status` before every retry.
    pub async fn load_with<F>(
        &self,
        endpoint: &Endpoint,
        params: &QueryParams,
        mut on_status: F,
    ) -> QueryOutcome
    where
        F: FnMut(LoadStatus),
    {
        let mut retries = 0u32;
        let outcome = loop {
            match self.cache.get(endpoint, params).await {
                Ok(value) => break QueryOutcome::Ready(value),
                Err(err) if self.policy.should_retry(&err, retries) => {
                    let delay = self.policy.delay_for_attempt(retries);
                    tracing::debug!(
                        endpoint = %endpoint,
                        retry = retries + 1,
                        delay = ?delay,
                        "query not ready, retrying"
                    );
                    on_status(LoadStatus::Processing);
                    self.sleeper.sleep(delay).await;
                    retries += 1;
                }
                Err(FetchError::Processing) => {
                    tracing::warn!(endpoint = %endpoint, retries, "query timed out");
                    break QueryOutcome::Timeout;
                }
                Err(err) => break QueryOutcome::Error(err),
            }
        };

        self.record(endpoint, params, retries + 1, &outcome);
        outcome
    }

    /// Load several named queries concurrently.
    pub async fn load_many(&self, queries: &[NamedQuery]) -> BTreeMap<String, QueryOutcome> {
        let loads = queries.iter().map(|query| async move {
            let outcome = self.load(&query.endpoint, &query.params).await;
            (query.name.clone(), outcome)
        });
        join_all(loads).await.into_iter().collect()
    }

    fn record(&self, endpoint: &Endpoint, params: &QueryParams, attempts: u32, outcome: &QueryOutcome) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        let (result, status_code, error) = match outcome {
            QueryOutcome::Ready(_) => (QueryResult::Success, None, None),
            QueryOutcome::Timeout => (
                QueryResult::Timeout,
                FetchError::Processing.status(),
                None,
            ),
            QueryOutcome::Error(err) => (QueryResult::Error, err.status(), Some(err.to_string())),
        };

        metrics.record(QueryMetrics {
            key: self.cache.key_for(endpoint, params).to_string(),
            url: self.cache.url_for(endpoint, params),
            attempts,
            status_code,
            result,
            error,
        });
    }
}
