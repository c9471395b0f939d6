use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::{auth::AuthError, validation::ValidationError};

/// Message shown when the catalog rejects the configured API key
pub const INVALID_API_KEY_MESSAGE: &str = "Invalid or expired API key. Please check your API key.";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Session belongs to a different user")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{}", INVALID_API_KEY_MESSAGE)]
    InvalidApiKey,

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    ProfileUpdate(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text shown to the client; upstream and lookup errors carry only their
    /// inner message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(e) => e.user_message(),
            AppError::NotFound(msg) | AppError::InvalidInput(msg) | AppError::ExternalApi(msg) => {
                msg.clone()
            }
            _ => self.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(ValidationError::ImageTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AppError::Validation(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Storage(_)
            | AppError::ProfileUpdate(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidApiKey | AppError::ExternalApi(_) | AppError::HttpClient(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.user_message()
        }));

        (self.status_code(), body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_api_key_message() {
        assert_eq!(
            AppError::InvalidApiKey.to_string(),
            "Invalid or expired API key. Please check your API key."
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::NotFound("user".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidApiKey, StatusCode::BAD_GATEWAY),
            (
                AppError::Validation(ValidationError::PasswordMismatch),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Validation(ValidationError::ImageTooLarge { max_bytes: 1024 }),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (AppError::Storage("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_upstream_message_has_no_prefix() {
        let error = AppError::ExternalApi("Incomplete server response: 503 Service Unavailable".into());
        assert_eq!(
            error.user_message(),
            "Incomplete server response: 503 Service Unavailable"
        );
        assert_eq!(
            error.to_string(),
            "External API error: Incomplete server response: 503 Service Unavailable"
        );
        assert_eq!(AppError::Forbidden.user_message(), "Session belongs to a different user");
    }
}
