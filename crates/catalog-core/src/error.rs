//! # Error Types
//!
//! Domain errors for catalog-core.
//!
//! Coercion itself never fails (bad values fall back to defaults), so the
//! only fallible pure operation is the page count arithmetic.

use thiserror::Error;

/// Core domain errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Page size reported by the remote API is zero or negative.
    #[error("Invalid page size: {0}")]
    InvalidPageSize(i64),

    /// Total record count reported by the remote API is negative.
    #[error("Invalid record total: {0}")]
    NegativeTotal(i64),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
