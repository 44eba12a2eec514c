use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server rejected request with status {status}")]
    ServerRejection { status: u16, body: String },

    #[error("Cache install failed: {0}")]
    CacheInstall(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Failures that leave a pending write in place for the next sync pass.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::ServerRejection { .. })
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, AppError::Network(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_rejection_are_retryable() {
        assert!(AppError::Network("refused".into()).is_retryable());
        assert!(
            AppError::ServerRejection {
                status: 500,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!AppError::StorageUnavailable("quota".into()).is_retryable());
    }

    #[test]
    fn only_network_counts_as_offline() {
        assert!(AppError::Network("timeout".into()).is_offline());
        assert!(
            !AppError::ServerRejection {
                status: 400,
                body: "bad".into()
            }
            .is_offline()
        );
    }
}
