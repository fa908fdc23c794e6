//! Declared fragment fields and their value kinds.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FragmentError;

/// Current overrides, keyed by field. Absent keys fall back to their default.
pub type Overrides = BTreeMap<String, FieldValue>;

/// The kind of a field, fixed by its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Flag,
    List,
}

impl FieldKind {
    /// Parse an already-decoded string as this kind.
    ///
    /// Flags accept `yes`, `true` and `1` as true and anything else as
    /// false. Lists split on `,`; an empty string is the empty list.
    /// Numbers that do not parse to a finite value yield `None`.
    pub fn parse(self, plain: &str) -> Option<FieldValue> {
        match self {
            Self::Text => Some(FieldValue::Text(plain.to_string())),
            Self::Number => plain
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Number),
            Self::Flag => Some(FieldValue::Flag(matches!(plain, "yes" | "true" | "1"))),
            Self::List if plain.is_empty() => Some(FieldValue::List(Vec::new())),
            Self::List => Some(FieldValue::List(
                plain.split(',').map(str::to_string).collect(),
            )),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::Flag => write!(f, "flag"),
            Self::List => write!(f, "list"),
        }
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Number(_) => FieldKind::Number,
            Self::Flag(_) => FieldKind::Flag,
            Self::List(_) => FieldKind::List,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Declaration of one fragment field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    /// Value used when the fragment carries none. Also fixes the field's kind.
    pub default: FieldValue,
    /// Buffer updates and commit them after the debounce delay.
    #[serde(default)]
    pub debounce: bool,
    /// Reject every update, including values found in the fragment at mount.
    #[serde(default)]
    pub immutable: bool,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, default: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
            debounce: false,
            immutable: false,
        }
    }

    /// Mark the field as debounced.
    pub fn debounced(mut self) -> Self {
        self.debounce = true;
        self
    }

    /// Mark the field as immutable.
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.default.kind()
    }
}

/// An ordered set of field declarations.
///
/// Declaration order is the order in which new keys are appended to the
/// fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentSchema {
    fields: Vec<FieldSpec>,
}

impl FragmentSchema {
    /// Build a schema, rejecting empty and duplicate keys.
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Result<Self, FragmentError> {
        let mut schema = Self::default();
        for field in fields {
            if field.key.is_empty() {
                return Err(FragmentError::EmptyKey);
            }
            if schema.contains(&field.key) {
                return Err(FragmentError::DuplicateKey(field.key));
            }
            schema.fields.push(field);
        }
        Ok(schema)
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a plain (not percent-encoded) string as the value of `key`.
    pub fn parse_value(&self, key: &str, plain: &str) -> Result<FieldValue, FragmentError> {
        let field = self
            .get(key)
            .ok_or_else(|| FragmentError::Undeclared(key.to_string()))?;
        field
            .kind()
            .parse(plain)
            .ok_or_else(|| FragmentError::InvalidValue {
                key: key.to_string(),
                value: plain.to_string(),
            })
    }
}
