use thiserror::Error;

/// Application-wide error types for siterank.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or missing configuration (queue mode, encoding, env vars).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed (fetching a ranking page).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Work queue store operation failed.
    #[error("Queue error: {0}")]
    QueueError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Reading the domain file or writing the result file failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error comes from the transport layer.
    ///
    /// The fetcher swallows these and hands back an empty payload.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_) | AppError::Timeout(_) | AppError::NetworkError(_)
        )
    }
}
