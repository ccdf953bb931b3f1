//! # Error Types Module
//!
//! Error types shared by the directory, approval and product workflows.
//! Every variant carries enough context to produce a human-readable reply.

use thiserror::Error;

/// Broad error categories used to pick a reply and a log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed price, stock, name or command arguments
    InvalidInput,
    /// The actor lacks the role required by the operation
    Unauthorized,
    /// Referenced user or product does not exist
    NotFound,
    /// No administrator identity is bound yet
    NoAdminConfigured,
    /// An outbound message could not be delivered
    NotificationDeliveryFailed,
    /// Storage or other unexpected failures
    Internal,
}

/// Errors returned by marketplace operations
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("bad format: {0}")]
    BadFormat(String),

    #[error("invalid price: {0:?}")]
    InvalidPrice(String),

    #[error("invalid stock: {0:?}")]
    InvalidStock(String),

    #[error("invalid product name")]
    InvalidName,

    #[error("user {user_id} is not allowed to {action}")]
    Unauthorized { user_id: i64, action: &'static str },

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("product not found: {0}")]
    ProductNotFound(i64),

    #[error("no administrator configured")]
    NoAdminConfigured,

    #[error("failed to deliver notification to {target}: {reason}")]
    NotificationDeliveryFailed { target: i64, reason: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl MarketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::BadFormat(_)
            | MarketError::InvalidPrice(_)
            | MarketError::InvalidStock(_)
            | MarketError::InvalidName => ErrorKind::InvalidInput,
            MarketError::Unauthorized { .. } => ErrorKind::Unauthorized,
            MarketError::UserNotFound(_) | MarketError::ProductNotFound(_) => ErrorKind::NotFound,
            MarketError::NoAdminConfigured => ErrorKind::NoAdminConfigured,
            MarketError::NotificationDeliveryFailed { .. } => {
                ErrorKind::NotificationDeliveryFailed
            }
            MarketError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub fn unauthorized(user_id: i64, action: &'static str) -> Self {
        MarketError::Unauthorized { user_id, action }
    }
}

impl From<sqlx::Error> for MarketError {
    fn from(err: sqlx::Error) -> Self {
        MarketError::Storage(err.to_string())
    }
}

pub type MarketResult<T> = Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(MarketError::InvalidPrice("x".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(MarketError::BadFormat("x".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(MarketError::unauthorized(1, "delete").kind(), ErrorKind::Unauthorized);
        assert_eq!(MarketError::ProductNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(MarketError::Storage("down".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_message_formatting() {
        let err = MarketError::unauthorized(42, "edit product 7");
        assert_eq!(err.to_string(), "user 42 is not allowed to edit product 7");

        let err = MarketError::InvalidStock("-3".to_string());
        assert_eq!(err.to_string(), "invalid stock: \"-3\"");
    }
}
