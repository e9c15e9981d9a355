//! Rejections raised by the catalog aggregates and value objects.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Why a category or product command was refused.
///
/// Only deterministic outcomes of the catalog rules live here. Lock failures
/// and code collisions between products are reported by the stores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Blank name or code, or a discount outside `[0, 100]`.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Category made its own parent, or a command addressed to another record.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Text that is not a category or product id.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Update of a category or product that was never created.
    #[error("not found")]
    NotFound,

    /// Create of a record that already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Rejected id text, kept verbatim with the parser's reason.
    pub fn invalid_id(raw: &str, reason: impl core::fmt::Display) -> Self {
        Self::InvalidId(format!("'{raw}': {reason}"))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
