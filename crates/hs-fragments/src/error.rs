//! Error types for fragment schemas.

/// Errors raised while declaring a schema or parsing user-supplied values.
///
/// Runtime misuse of a mounted synchronizer is never an error: it is logged
/// and reported through `SetOutcome`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FragmentError {
    /// A field was declared with an empty key.
    #[error("field key must not be empty")]
    EmptyKey,

    /// Two fields share a key.
    #[error("field `{0}` is declared twice")]
    DuplicateKey(String),

    /// The key is not part of the schema.
    #[error("field `{0}` is not declared")]
    Undeclared(String),

    /// A value could not be parsed as the field's kind.
    #[error("invalid value for `{key}`: {value:?}")]
    InvalidValue { key: String, value: String },

    /// A browser API call failed.
    #[error("browser error: {0}")]
    Browser(String),
}
