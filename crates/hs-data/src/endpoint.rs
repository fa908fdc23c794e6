//! Endpoints and query parameters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FetchError;

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Absolute path or full URL, used verbatim.
    Path(String),
    /// Logical query name, resolved against the analytics base path.
    Query(String),
}

impl Endpoint {
    /// Create a path endpoint.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Create a logical query endpoint.
    pub fn query(name: impl Into<String>) -> Self {
        Self::Query(name.into())
    }

    /// Resolve to a request path: `<base>/<name>/` for queries, verbatim for paths.
    pub fn resolve(&self, analytics_base: &str) -> String {
        match self {
            Self::Path(path) => path.clone(),
            Self::Query(name) => format!(
                "{}/{}/",
                analytics_base.trim_end_matches('/'),
                name.trim_matches('/')
            ),
        }
    }

    /// Build the full request URL including the query string.
    pub fn url(&self, analytics_base: &str, params: &QueryParams) -> String {
        let base = self.resolve(analytics_base);
        if params.is_empty() {
            return base;
        }
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{}{}{}", base, separator, params.to_query_string())
    }
}

impl From<&str> for Endpoint {
    /// Strings starting with `/` or carrying a scheme are paths, anything else is a query name.
    fn from(s: &str) -> Self {
        if s.starts_with('/') || s.contains("://") {
            Self::Path(s.to_string())
        } else {
            Self::Query(s.to_string())
        }
    }
}

impl From<String> for Endpoint {
    fn from(s: String) -> Self {
        Endpoint::from(s.as_str())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path),
            Self::Query(name) => write!(f, "query:{}", name),
        }
    }
}

/// A scalar query parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => {
                write!(f, "{}", *x as i64)
            }
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

/// Flat, key-sorted query parameters.
///
/// Absent values are never stored, so they take no part in cache keys or
/// outgoing query strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a parameter only when a value is present.
    pub fn with_opt<V: Into<ParamValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Insert a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert a parameter when present, remove it when absent.
    pub fn insert_opt<V: Into<ParamValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        let key = key.into();
        match value {
            Some(value) => {
                self.0.insert(key, value.into());
            }
            None => {
                self.0.remove(&key);
            }
        }
    }

    /// Get a parameter value.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parameters with values coerced to strings, in key order.
    pub fn canonical_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Percent-encoded `key=value&key2=value2` string.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    urlencoding::encode(k),
                    urlencoding::encode(&v.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Build parameters from a JSON object. `null` members are skipped.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, FetchError> {
        let object = value
            .as_object()
            .ok_or_else(|| FetchError::InvalidParams("expected a JSON object".to_string()))?;

        let mut params = Self::new();
        for (key, value) in object {
            let value = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::Bool(b) => ParamValue::Bool(*b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => ParamValue::Int(i),
                    None => ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                serde_json::Value::String(s) => ParamValue::Text(s.clone()),
                other => {
                    return Err(FetchError::InvalidParams(format!(
                        "parameter {:?} is not a scalar: {}",
                        key, other
                    )))
                }
            };
            params.0.insert(key.clone(), value);
        }
        Ok(params)
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_from_str() {
        assert_eq!(
            Endpoint::from("/api/v1/archetypes/"),
            Endpoint::path("/api/v1/archetypes/")
        );
        assert_eq!(
            Endpoint::from("https://example.com/x"),
            Endpoint::path("https://example.com/x")
        );
        assert_eq!(
            Endpoint::from("list_decks_by_win_rate"),
            Endpoint::query("list_decks_by_win_rate")
        );
    }

    #[test]
    fn test_query_resolves_against_base() {
        let endpoint = Endpoint::query("single_card_stats_over_time");
        assert_eq!(
            endpoint.resolve("/analytics/query/"),
            "/analytics/query/single_card_stats_over_time/"
        );
        assert_eq!(
            Endpoint::path("/api/v1/cards/").resolve("/analytics/query"),
            "/api/v1/cards/"
        );
    }

    #[test]
    fn test_url_with_params() {
        let params = QueryParams::new()
            .with("GameType", "RANKED_STANDARD")
            .with("card_id", 374);
        let url = Endpoint::query("single_card_stats").url("/analytics/query", &params);
        assert_eq!(
            url,
            "/analytics/query/single_card_stats/?GameType=RANKED_STANDARD&card_id=374"
        );
    }

    #[test]
    fn test_url_without_params_has_no_question_mark() {
        let url = Endpoint::path("/api/v1/account/").url("/analytics/query", &QueryParams::new());
        assert_eq!(url, "/api/v1/account/");
    }

    #[test]
    fn test_url_appends_to_existing_query() {
        let url = Endpoint::path("/api/v1/decks/?format=json")
            .url("/analytics/query", &QueryParams::new().with("page", 2));
        assert_eq!(url, "/api/v1/decks/?format=json&page=2");
    }

    #[test]
    fn test_query_string_is_percent_encoded() {
        let params = QueryParams::new().with("q", "two words&more");
        assert_eq!(params.to_query_string(), "q=two%20words%26more");
    }

    #[test]
    fn test_absent_values_are_dropped() {
        let params = QueryParams::new()
            .with("a", "1")
            .with_opt::<i64>("b", None)
            .with_opt("c", Some(true));
        assert_eq!(params.len(), 2);
        assert!(params.get("b").is_none());
        assert_eq!(params.to_query_string(), "a=1&c=true");
    }

    #[test]
    fn test_insert_opt_none_removes() {
        let mut params = QueryParams::new().with("Region", "EU");
        params.insert_opt::<&str>("Region", None);
        assert!(params.is_empty());
    }

    #[test]
    fn test_param_display() {
        assert_eq!(ParamValue::Float(3.0).to_string(), "3");
        assert_eq!(ParamValue::Float(0.5).to_string(), "0.5");
        assert_eq!(ParamValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_from_json_skips_null() {
        let params =
            QueryParams::from_json(&json!({"a": "1", "b": 2, "c": null, "d": 1.5})).unwrap();
        assert_eq!(
            params.canonical_pairs(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("d".to_string(), "1.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_json_rejects_nested() {
        assert!(QueryParams::from_json(&json!({"a": [1, 2]})).is_err());
        assert!(QueryParams::from_json(&json!("nope")).is_err());
    }
}
