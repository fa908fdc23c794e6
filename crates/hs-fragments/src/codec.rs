//! Fragment string encoding.
//!
//! The wire form is `#key=value&key=value` with keys and values
//! percent-encoded. List elements are encoded one by one and joined with a
//! literal `,`; flags are `yes`/`no`. An empty hash and the sentinel `#_`
//! both mean "no state".

use std::borrow::Cow;

use crate::schema::{FieldKind, FieldValue, FragmentSchema, Overrides};

/// Placeholder hash some pages write instead of an empty one.
pub const EMPTY_SENTINEL: &str = "_";

/// One `key=value` segment of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    /// Decoded key.
    pub key: String,
    /// Value exactly as it appears in the fragment, still percent-encoded.
    pub value: String,
    /// The segment as read from a fragment. Written back unchanged.
    pub raw: Option<String>,
}

impl RawPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            raw: None,
        }
    }

    fn parsed(segment: &str) -> Self {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        Self {
            key: decode(key).into_owned(),
            value: value.to_string(),
            raw: Some(segment.to_string()),
        }
    }
}

/// Split a fragment (with or without the leading `#`) into its pairs.
///
/// Empty segments are skipped; a segment without `=` has an empty value.
pub fn parse_fragment(hash: &str) -> Vec<RawPair> {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    if hash.is_empty() || hash == EMPTY_SENTINEL {
        return Vec::new();
    }

    hash.split('&')
        .filter(|segment| !segment.is_empty())
        .map(RawPair::parsed)
        .collect()
}

/// Join pairs into a fragment: `#k=v&...`, or the empty string for no pairs.
///
/// Pairs read by [`parse_fragment`] keep their original segment text.
pub fn encode_fragment(pairs: &[RawPair]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let body = pairs
        .iter()
        .map(|pair| match &pair.raw {
            Some(raw) => raw.clone(),
            None => format!("{}={}", urlencoding::encode(&pair.key), pair.value),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("#{}", body)
}

/// Decode a raw fragment value as `kind`. `None` if it does not parse.
pub fn cast(kind: FieldKind, raw: &str) -> Option<FieldValue> {
    match kind {
        FieldKind::List if raw.is_empty() => Some(FieldValue::List(Vec::new())),
        FieldKind::List => Some(FieldValue::List(
            raw.split(',').map(|item| decode(item).into_owned()).collect(),
        )),
        _ => kind.parse(&decode(raw)),
    }
}

/// Encode a value for the fragment. Inverse of [`cast`].
pub fn stringify(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => urlencoding::encode(s).into_owned(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Flag(true) => "yes".to_string(),
        FieldValue::Flag(false) => "no".to_string(),
        FieldValue::List(items) => items
            .iter()
            .map(|item| urlencoding::encode(item))
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Read the overrides a fragment carries for `schema`.
///
/// Undeclared keys, immutable keys and values that fail to parse are
/// skipped. Values equal to their default are dropped unless
/// `keep_defaults` is set. A repeated key keeps its last value.
pub fn decode_overrides(hash: &str, schema: &FragmentSchema, keep_defaults: bool) -> Overrides {
    let mut overrides = Overrides::new();
    for pair in parse_fragment(hash) {
        let Some(field) = schema.get(&pair.key) else {
            continue;
        };
        if field.immutable {
            tracing::debug!(key = %pair.key, "ignoring immutable key in fragment");
            continue;
        }
        match cast(field.kind(), &pair.value) {
            Some(value) if keep_defaults || value != field.default => {
                overrides.insert(pair.key, value);
            }
            Some(_) => {
                overrides.remove(&pair.key);
            }
            None => {
                tracing::debug!(key = %pair.key, value = %pair.value, "unparseable fragment value");
            }
        }
    }
    overrides
}

fn decode(s: &str) -> Cow<'_, str> {
    urlencoding::decode(s).unwrap_or(Cow::Borrowed(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    #[test]
    fn test_parse_handles_sentinels() {
        assert!(parse_fragment("").is_empty());
        assert!(parse_fragment("#").is_empty());
        assert!(parse_fragment("#_").is_empty());
    }

    #[test]
    fn test_parse_pairs() {
        let pairs: Vec<_> = parse_fragment("#sortBy=winrate&&flag&page=3")
            .into_iter()
            .map(|pair| (pair.key, pair.value))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("sortBy".to_string(), "winrate".to_string()),
                ("flag".to_string(), String::new()),
                ("page".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_parsed_segments_are_written_back_verbatim() {
        let pairs = parse_fragment("#section&filter[0]=x&a%20b=1");
        assert_eq!(pairs[0].key, "section");
        assert_eq!(pairs[2].key, "a b");
        assert_eq!(encode_fragment(&pairs), "#section&filter[0]=x&a%20b=1");
    }

    #[test]
    fn test_values_stay_encoded_until_cast() {
        let pairs = parse_fragment("#b=two%20words&list=a%2Cb,c");
        assert_eq!(pairs[0].value, "two%20words");
        assert_eq!(
            cast(FieldKind::List, &pairs[1].value),
            Some(FieldValue::from(vec!["a,b", "c"]))
        );
        assert_eq!(
            cast(FieldKind::Text, &pairs[0].value),
            Some(FieldValue::from("two words"))
        );
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&FieldValue::from("two words")), "two%20words");
        assert_eq!(stringify(&FieldValue::Number(3.0)), "3");
        assert_eq!(stringify(&FieldValue::Number(0.5)), "0.5");
        assert_eq!(stringify(&FieldValue::Flag(true)), "yes");
        assert_eq!(stringify(&FieldValue::Flag(false)), "no");
        assert_eq!(stringify(&FieldValue::from(vec!["x", "y,z"])), "x,y%2Cz");
    }

    #[test]
    fn test_cast_inverts_stringify() {
        let values = [
            FieldValue::from("50% off & more"),
            FieldValue::Number(-12.25),
            FieldValue::Flag(true),
            FieldValue::Flag(false),
            FieldValue::from(vec!["a b", "c,d", "é"]),
        ];
        for value in values {
            assert_eq!(cast(value.kind(), &stringify(&value)), Some(value));
        }
    }

    #[test]
    fn test_encode_fragment() {
        assert_eq!(encode_fragment(&[]), "");
        assert_eq!(
            encode_fragment(&[RawPair::new("a b", "1"), RawPair::new("c", "x,y")]),
            "#a%20b=1&c=x,y"
        );
    }

    #[test]
    fn test_decode_overrides_filters() {
        let schema = FragmentSchema::new([
            FieldSpec::new("page", 1),
            FieldSpec::new("premium", "off").immutable(),
            FieldSpec::new("sortBy", "popularity"),
        ])
        .unwrap();

        let overrides = decode_overrides(
            "#page=abc&premium=on&other=1&sortBy=popularity",
            &schema,
            false,
        );
        assert!(overrides.is_empty());

        let overrides = decode_overrides("#sortBy=popularity&page=2", &schema, true);
        assert_eq!(overrides.get("sortBy"), Some(&FieldValue::from("popularity")));
        assert_eq!(overrides.get("page"), Some(&FieldValue::Number(2.0)));
    }
}
