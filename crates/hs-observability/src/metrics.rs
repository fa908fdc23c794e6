//! Request cache and polling metrics.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

/// Live counters owned by a request cache.
///
/// Single-threaded like the cache itself, so plain `Cell`s suffice.
#[derive(Debug, Default)]
pub struct CacheCounters {
    network_requests: Cell<u64>,
    hits: Cell<u64>,
    coalesced: Cell<u64>,
    failures: Cell<u64>,
}

impl CacheCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A request was sent over the network.
    pub fn record_request(&self) {
        bump(&self.network_requests);
    }

    /// A call was answered from a resolved entry.
    pub fn record_hit(&self) {
        bump(&self.hits);
    }

    /// A call joined a request already in flight.
    pub fn record_coalesced(&self) {
        bump(&self.coalesced);
    }

    /// A request failed (including "still processing").
    pub fn record_failure(&self) {
        bump(&self.failures);
    }

    /// Copy the current values.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            network_requests: self.network_requests.get(),
            hits: self.hits.get(),
            coalesced: self.coalesced.get(),
            failures: self.failures.get(),
        }
    }
}

fn bump(cell: &Cell<u64>) {
    cell.set(cell.get().saturating_add(1));
}

/// Point-in-time copy of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Requests sent over the network.
    pub network_requests: u64,
    /// Calls answered from a resolved entry.
    pub hits: u64,
    /// Calls that joined an in-flight request.
    pub coalesced: u64,
    /// Requests that failed.
    pub failures: u64,
}

impl CacheStats {
    /// Fraction of calls that did not go to the network.
    pub fn hit_ratio(&self) -> f64 {
        let served = self.hits + self.coalesced;
        let total = served + self.network_requests;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

/// How a polled query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryResult {
    Success,
    Timeout,
    Error,
}

/// Metrics for one polled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// Cache key of the query.
    pub key: String,
    /// Request URL.
    pub url: String,
    /// Requests issued, including the first.
    pub attempts: u32,
    /// Final HTTP status, if one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// How the query ended.
    pub result: QueryResult,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collector for per-query metrics.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    queries: RefCell<Vec<QueryMetrics>>,
}

impl MetricsCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished query.
    pub fn record(&self, metrics: QueryMetrics) {
        tracing::debug!(
            key = %metrics.key,
            attempts = metrics.attempts,
            result = ?metrics.result,
            "query finished"
        );
        self.queries.borrow_mut().push(metrics);
    }

    /// All recorded queries, oldest first.
    pub fn queries(&self) -> Vec<QueryMetrics> {
        self.queries.borrow().clone()
    }

    /// Aggregate the recorded queries.
    pub fn summary(&self) -> MetricsSummary {
        let queries = self.queries.borrow();
        let mut summary = MetricsSummary {
            total: queries.len(),
            ..MetricsSummary::default()
        };
        for query in queries.iter() {
            summary.attempts += u64::from(query.attempts);
            match query.result {
                QueryResult::Success => summary.succeeded += 1,
                QueryResult::Timeout => summary.timed_out += 1,
                QueryResult::Error => summary.failed += 1,
            }
        }
        summary
    }

    /// Serialize all records as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&*self.queries.borrow()).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Aggregated query metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total: usize,
    pub succeeded: usize,
    pub timed_out: usize,
    pub failed: usize,
    /// Requests issued across all queries.
    pub attempts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(result: QueryResult, attempts: u32) -> QueryMetrics {
        QueryMetrics {
            key: "k".to_string(),
            url: "/analytics/query/x/".to_string(),
            attempts,
            status_code: Some(200),
            result,
            error: None,
        }
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = CacheCounters::new();
        counters.record_request();
        counters.record_hit();
        counters.record_hit();
        counters.record_coalesced();
        counters.record_failure();

        let stats = counters.snapshot();
        assert_eq!(stats.network_requests, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.coalesced, 1);
        assert_eq!(stats.failures, 1);
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_ratio_empty() {
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }

    #[test]
    fn test_summary() {
        let collector = MetricsCollector::new();
        collector.record(query(QueryResult::Success, 1));
        collector.record(query(QueryResult::Timeout, 4));
        collector.record(query(QueryResult::Error, 1));

        let summary = collector.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.attempts, 6);
    }

    #[test]
    fn test_json_skips_empty_fields() {
        let collector = MetricsCollector::new();
        let mut q = query(QueryResult::Timeout, 4);
        q.status_code = None;
        collector.record(q);
        let json = collector.to_json();
        assert!(json.contains(r#""result":"timeout""#));
        assert!(!json.contains("status_code"));
        assert!(!json.contains("error"));
    }
}
