//! Error types for chatkeep.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

/// Primary error type for all session, store and model operations.
///
/// None of these are retried by the session; they propagate to the caller
/// and end the interactive loop.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store unavailable ({category}): {message}")]
    StoreUnavailable {
        category: ErrorCategory,
        message: String,
    },

    #[error("Model unavailable ({category}): {message}")]
    ModelUnavailable {
        category: ErrorCategory,
        message: String,
    },

    #[error("Duplicate conversation: {count} rows titled '{title}'")]
    DuplicateConversation { title: String, count: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatError {
    /// Store failure with an explicit cause.
    pub fn store(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            category,
            message: message.into(),
        }
    }

    /// Store failure from an HTTP status and response body.
    pub fn store_status(status: u16, body: &str) -> Self {
        Self::store(
            ErrorCategory::from_status(status),
            format!("status {status}: {body}"),
        )
    }

    /// Store failure from a transport error.
    pub fn store_transport(err: reqwest::Error) -> Self {
        Self::store(ErrorCategory::from_reqwest(&err), err.to_string())
    }

    /// Model failure with an explicit cause.
    pub fn model(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            category,
            message: message.into(),
        }
    }

    /// Model failure from an HTTP status and response body.
    pub fn model_status(status: u16, body: &str) -> Self {
        Self::model(
            ErrorCategory::from_status(status),
            format!("status {status}: {body}"),
        )
    }

    /// Model failure from a transport error.
    pub fn model_transport(err: reqwest::Error) -> Self {
        Self::model(ErrorCategory::from_reqwest(&err), err.to_string())
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StoreUnavailable { category, .. } | Self::ModelUnavailable { category, .. } => {
                *category
            }
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether retrying the whole turn might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::ModelUnavailable { .. }
        ) && matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_categories() {
        assert_eq!(ErrorCategory::from_status(401), ErrorCategory::Authentication);
        assert_eq!(ErrorCategory::from_status(403), ErrorCategory::Authentication);
        assert_eq!(ErrorCategory::from_status(429), ErrorCategory::RateLimit);
        assert_eq!(ErrorCategory::from_status(503), ErrorCategory::Server);
        assert_eq!(ErrorCategory::from_status(404), ErrorCategory::Api);
    }

    #[test]
    fn only_transient_collaborator_failures_are_retryable() {
        assert!(ChatError::model_status(429, "slow down").is_retryable());
        assert!(ChatError::store_status(502, "bad gateway").is_retryable());
        assert!(!ChatError::model_status(401, "bad key").is_retryable());
        assert!(!ChatError::Configuration("missing key".into()).is_retryable());
        assert!(!ChatError::DuplicateConversation {
            title: "Demo".into(),
            count: 2
        }
        .is_retryable());
    }

    #[test]
    fn display_names_the_collaborator_and_cause() {
        let err = ChatError::store_status(503, "down");
        assert_eq!(
            err.to_string(),
            "Store unavailable (server): status 503: down"
        );
    }
}
