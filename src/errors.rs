use crate::services::{drive_service::DriveError, github_service::GithubError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<GithubError> for AppError {
    fn from(err: GithubError) -> Self {
        let status = match &err {
            GithubError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GithubError::NotFound(_) => StatusCode::NOT_FOUND,
            GithubError::InvalidToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GithubError::Status(_) | GithubError::Decode(_) | GithubError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        AppError::new(status, err.to_string())
    }
}

impl From<DriveError> for AppError {
    fn from(err: DriveError) -> Self {
        let status = match &err {
            DriveError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
        AppError::new(status, err.to_string())
    }
}
