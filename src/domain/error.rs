//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent catalog and tree-building violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate feature id: {id}")]
    DuplicateId { id: u32 },

    #[error("invalid feature_order for feature {id}: {raw:?} ({reason})")]
    InvalidEncoding { id: u32, raw: String, reason: String },

    #[error("invalid catalog record #{index}: {message}")]
    Validation { index: usize, message: String },

    #[error("unknown feature id: {0}")]
    UnknownFeature(u32),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
