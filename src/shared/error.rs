use crate::domain::value_objects::{ItemId, QueryKey};
use thiserror::Error;

/// リモート呼び出しの失敗
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to fetch page for {query}: {source}")]
    FetchFailed {
        query: QueryKey,
        #[source]
        source: TransportError,
    },
    #[error("Failed to toggle like on {item_id}: {source}")]
    ToggleFailed {
        item_id: ItemId,
        #[source]
        source: TransportError,
    },
    #[error("Failed to create item: {source}")]
    CreateFailed {
        #[source]
        source: TransportError,
    },
    #[error("Mutations require an authenticated session")]
    Unauthenticated,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// リモート側の失敗に起因するエラーかどうか
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            AppError::FetchFailed { source, .. }
            | AppError::ToggleFailed { source, .. }
            | AppError::CreateFailed { source } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_is_exposed_for_remote_failures() {
        let err = AppError::ToggleFailed {
            item_id: ItemId::new("t1").unwrap(),
            source: TransportError::Network("connection reset".to_string()),
        };
        assert_eq!(
            err.transport_error(),
            Some(&TransportError::Network("connection reset".to_string()))
        );
        assert!(AppError::Unauthenticated.transport_error().is_none());
    }

    #[test]
    fn fetch_failed_message_names_the_view() {
        let err = AppError::FetchFailed {
            query: QueryKey::FollowingOnly,
            source: TransportError::Rejected("bad cursor".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch page for feed:following: Request rejected: bad cursor"
        );
    }
}
