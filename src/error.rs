use crate::common::key::PhysicalKey;

use std::fmt;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error returned by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A single field-level validation failure.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Issue {
    /// Path of the offending field, outermost segment first. Empty for the whole record.
    pub path: Vec<String>,
    /// Human readable description of the failure.
    pub message: String,
}

impl Issue {
    /// Build an issue for a top-level field.
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: vec![name.into()],
            message: message.into(),
        }
    }
}

/// Structured error produced by a [`Schema`](crate::entity::Schema).
///
/// The issue list is surfaced verbatim through [`Error::Validation`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationError {
    /// Every failure found in the candidate record.
    pub issues: Vec<Issue>,
}

impl ValidationError {
    /// Validation error with a single issue.
    pub fn single(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<_> = self
            .issues
            .iter()
            .map(|issue| {
                if issue.path.is_empty() {
                    issue.message.clone()
                } else {
                    format!("{}: {}", issue.path.join("."), issue.message)
                }
            })
            .collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by the store façade and the entity layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An update or entity read targeted a key with no stored record.
    #[error("no record found for {key}")]
    NotFound {
        /// The physical key that was looked up.
        key: PhysicalKey,
    },
    /// The candidate record violates the entity schema.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// The precondition of a single conditional write did not hold.
    #[error("conflicting write: {0}")]
    Conflict(String),
    /// At least one item of a transaction failed its precondition; nothing was applied.
    #[error("transaction aborted: {}", .reasons.join(", "))]
    TransactionAborted {
        /// Cancellation reason per transaction item, in request order.
        reasons: Vec<String>,
    },
    /// The key strategy cannot rebuild a physical key from an identifier alone.
    #[error("{strategy} keys cannot be derived from an id alone")]
    UnsupportedReverseMapping {
        /// Name of the key strategy.
        strategy: &'static str,
    },
    /// The requested capability was not supplied.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    /// The filter tree is malformed.
    #[error("invalid expression: {node}")]
    InvalidExpression {
        /// Rendering of the offending node.
        node: String,
    },
    /// A physical key component is empty.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// A record lacks a field the key strategy needs.
    #[error("record is missing key attribute `{0}`")]
    MissingKeyAttribute(String),
    /// A pagination cursor could not be decoded.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    /// Conversion between records and store attribute values failed.
    #[error(transparent)]
    Serialization(#[from] serde_dynamo::Error),
    /// The underlying store transport failed.
    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),
}

impl Error {
    /// Wrap an arbitrary transport error.
    pub fn transport(error: impl Into<BoxError>) -> Self {
        Self::Transport(error.into())
    }

    pub(crate) fn invalid_expression(node: impl fmt::Debug) -> Self {
        Self::InvalidExpression {
            node: format!("{node:?}"),
        }
    }
}
