use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Store write error: {0}")]
    StoreWriteError(String),

    #[error("Store subscription error: {0}")]
    StoreSubscriptionError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::NetworkError("Request timeout".to_string())
        } else if err.is_connect() {
            AppError::NetworkError("Failed to connect to remote service".to_string())
        } else if err.is_decode() {
            AppError::DecodeError(err.to_string())
        } else if let Some(status) = err.status() {
            AppError::from_status(status.as_u16(), &err.to_string())
        } else {
            AppError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::DecodeError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::InvalidInput(format!("Invalid number: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::DecodeError(format!("Invalid date/time: {}", err))
    }
}

impl AppError {
    /// Map a non-success HTTP status to the matching error kind.
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            404 => AppError::NotFound(message.to_string()),
            401 | 403 => AppError::Unauthorized(message.to_string()),
            429 => AppError::RateLimitError(message.to_string()),
            _ => AppError::ApiError(format!("HTTP {}: {}", status, message)),
        }
    }

    /// Failures worth trying again unchanged: connectivity, throttling, server-side errors
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_) | AppError::RateLimitError(_) | AppError::ApiError(_)
        )
    }

    /// Short text shown to the user in a view-model `error` field.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NetworkError(_) => {
                "Network unavailable. Check your connection and try again.".to_string()
            }
            AppError::DecodeError(_) => "Received an unexpected response from the server.".to_string(),
            AppError::NotFound(_) => "The requested item could not be found.".to_string(),
            AppError::Unauthorized(_) | AppError::AuthError(_) => {
                "You are not authorized. Please sign in again.".to_string()
            }
            AppError::RateLimitError(_) => "Too many requests. Please wait a moment.".to_string(),
            AppError::StoreWriteError(_) => "Could not save your favorites change.".to_string(),
            AppError::StoreSubscriptionError(_) => "Could not load your favorites.".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::ApiError(_) | AppError::ConfigError(_) | AppError::InternalError(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
