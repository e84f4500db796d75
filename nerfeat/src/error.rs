//! Error types for corpus reading, vocabulary construction and encoding.

use thiserror::Error;

/// Errors raised while turning a tagged corpus into feature vectors.
#[derive(Error, Debug)]
pub enum NerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A non-blank corpus line that is not exactly `LABEL POS WORD`.
    #[error("{source_name}:{line_number}: expected 3 whitespace separated fields, got {line:?}")]
    MalformedLine {
        source_name: String,
        line_number: usize,
        line: String,
    },

    #[error("unrecognized BIO label {label:?}")]
    BadLabel { label: String },

    /// A reserved UNK/PHI/OMEGA or predicate entry is not in the table.
    #[error("feature {key:?} is missing from the feature-id table")]
    MissingFeature { key: String },

    #[error("feature {key:?} appears more than once in the feature-id table")]
    DuplicateFeature { key: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("feature-id table serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
