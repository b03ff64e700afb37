//! Conversion errors

use thiserror::Error;

/// Fatal conversion failure; the source document has to be fixed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unsupported node `{kind}` cannot be mapped to help file syntax")]
    UnsupportedNode { kind: String },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("anchor `{anchor}` still collides after {attempts} suffix attempts")]
    AnchorCollision { anchor: String, attempts: usize },

    #[error("invalid HTML input: {0}")]
    Html(String),
}

impl ParseError {
    pub fn unsupported(kind: impl Into<String>) -> Self {
        ParseError::UnsupportedNode { kind: kind.into() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        ParseError::Malformed(reason.into())
    }
}
