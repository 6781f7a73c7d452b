//! Report store error types.
//!
//! Defined in `examkit-core` so session drivers can downcast persistence
//! failures and classify them without string matching.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when persisting or reading exam reports.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered but refused the report.
    #[error("report rejected: {0}")]
    Rejected(String),

    /// No report with this id exists.
    #[error("report not found: {0}")]
    NotFound(Uuid),

    /// A local filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The store returned an HTTP error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),
}

impl StoreError {
    /// Returns `true` if repeating the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        match self {
            StoreError::Rejected(_) | StoreError::NotFound(_) => true,
            StoreError::Api { status, .. } => (400..500).contains(status) && *status != 429,
            StoreError::Io(_) | StoreError::Timeout(_) | StoreError::Network(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanence() {
        assert!(StoreError::Rejected("duplicate".into()).is_permanent());
        assert!(StoreError::Api {
            status: 401,
            message: "unauthorized".into()
        }
        .is_permanent());
        assert!(!StoreError::Api {
            status: 429,
            message: "slow down".into()
        }
        .is_permanent());
        assert!(!StoreError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_permanent());
        assert!(!StoreError::Timeout(30).is_permanent());
    }

    #[test]
    fn display_messages() {
        let err = StoreError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
        assert!(StoreError::Rejected("no".into())
            .to_string()
            .starts_with("report rejected"));
    }
}
