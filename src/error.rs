/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Location error: {0}")]
    Location(String),
}

impl AppError {
    /// Network, remote API and store failures. Callers show stale or empty data
    /// for these and never retry automatically.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Store(_) | AppError::HttpClient(_) | AppError::ExternalApi(_) | AppError::Io(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
