//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  InvalidResponse        │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │                         │ │
//! │  │  ConfigLoad/Save│  │  Status         │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────────────────────────────┐  │
//! │  │    Database     │  │     Run                                     │  │
//! │  │                 │  │                                             │  │
//! │  │  DatabaseError  │  │  FirstPageUnavailable (aborts the run)      │  │
//! │  └─────────────────┘  └─────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only page 1 failures abort a scheduler run. Every other page failure is
//! logged and the run moves on.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request could not be sent or the body could not be read.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request exceeded the per-request timeout.
    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    /// Remote answered with a non-success status.
    #[error("Unexpected HTTP status {status} for page {page}")]
    Status { status: u16, page: u32 },

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Body is not JSON or lacks the record list.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Database Errors
    // =========================================================================
    /// Store read or write failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // =========================================================================
    // Run Errors
    // =========================================================================
    /// Page 1 could not be fetched, or it carried no usable page count.
    #[error("First page unavailable: {0}")]
    FirstPageUnavailable(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<catalog_db::DbError> for SyncError {
    fn from(err: catalog_db::DbError) -> Self {
        SyncError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<catalog_core::CoreError> for SyncError {
    fn from(err: catalog_core::CoreError) -> Self {
        SyncError::InvalidResponse(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if a retry of the same request might succeed.
    ///
    /// ## Retryable Errors
    /// - Transport failures and timeouts
    /// - 5xx and 429 responses
    /// - Malformed bodies (the API occasionally truncates under load)
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Http(_) | SyncError::Timeout(_) | SyncError::InvalidResponse(_) => true,
            SyncError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::Http("connection reset".into()).is_retryable());
        assert!(SyncError::Timeout(30).is_retryable());
        assert!(SyncError::Status { status: 503, page: 4 }.is_retryable());
        assert!(SyncError::InvalidResponse("missing list".into()).is_retryable());

        assert!(!SyncError::Status { status: 404, page: 4 }.is_retryable());
        assert!(!SyncError::InvalidConfig("bad config".into()).is_retryable());
        assert!(!SyncError::DatabaseError("locked".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Status { status: 502, page: 17 };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("17"));
    }
}
