//! Cache key derivation.

use std::fmt;

use hs_data::QueryParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cache key uniquely identifying a request.
///
/// The key is the canonical JSON form `["<path>", [["k", "v"], ...]]` with
/// parameters sorted by name and values coerced to strings. Unlike plain
/// concatenation, `{a: "1", b: "2"}` and `{a: "12", b: ""}` cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the cache key for a resolved request path and its parameters.
pub fn gen_cache_key(path: &str, params: &QueryParams) -> CacheKey {
    let pairs = params
        .canonical_pairs()
        .into_iter()
        .map(|(k, v)| Value::Array(vec![Value::String(k), Value::String(v)]))
        .collect();
    let canonical = Value::Array(vec![Value::String(path.to_string()), Value::Array(pairs)]);
    CacheKey(canonical.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/analytics/query/list_decks_by_win_rate/";

    #[test]
    fn test_key_ignores_insertion_order() {
        let p1 = QueryParams::new()
            .with("GameType", "RANKED_STANDARD")
            .with("RankRange", "LEGEND_THROUGH_TWENTY")
            .with("TimeRange", "LAST_30_DAYS");
        let p2 = QueryParams::new()
            .with("TimeRange", "LAST_30_DAYS")
            .with("GameType", "RANKED_STANDARD")
            .with("RankRange", "LEGEND_THROUGH_TWENTY");
        assert_eq!(gen_cache_key(PATH, &p1), gen_cache_key(PATH, &p2));
    }

    #[test]
    fn test_key_coerces_values_to_strings() {
        let numeric = QueryParams::new().with("card_id", 374);
        let text = QueryParams::new().with("card_id", "374");
        assert_eq!(gen_cache_key(PATH, &numeric), gen_cache_key(PATH, &text));
    }

    #[test]
    fn test_concatenation_collision_is_avoided() {
        let p1 = QueryParams::new().with("a", "1").with("b", 2);
        let p2 = QueryParams::new().with("a", "12").with("b", "");
        assert_ne!(gen_cache_key(PATH, &p1), gen_cache_key(PATH, &p2));
    }

    #[test]
    fn test_key_depends_on_path() {
        let params = QueryParams::new();
        assert_ne!(
            gen_cache_key("/a/", &params),
            gen_cache_key("/b/", &params)
        );
    }

    #[test]
    fn test_absent_params_do_not_change_key() {
        let with_absent = QueryParams::new().with("a", "1").with_opt::<&str>("b", None);
        let without = QueryParams::new().with("a", "1");
        assert_eq!(
            gen_cache_key(PATH, &with_absent),
            gen_cache_key(PATH, &without)
        );
    }

    #[test]
    fn test_key_format() {
        let key = gen_cache_key("/x/", &QueryParams::new().with("b", "2").with("a", "1"));
        assert_eq!(key.as_str(), r#"["/x/",[["a","1"],["b","2"]]]"#);
    }
}
