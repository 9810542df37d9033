//! HTTP response types and utilities
//!
//! Every endpoint answers with the same [`ApiResponse`] envelope, and
//! [`handle_error`] is the one place where `AppError` becomes a status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::services::SyncOutcome;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(self)).into_response()
    }
}

/// Result of a catalog mutation: how it was mirrored, plus the affected
/// item when there still is one
#[derive(Debug, Clone, Serialize)]
pub struct MutationResponse<T> {
    pub sync: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<T>,
}

/// Helper function to convert AppResult to HTTP response
pub fn handle_result<T>(result: AppResult<T>) -> Response
where
    T: Serialize,
{
    match result {
        Ok(data) => ok(data).into_response(),
        Err(error) => handle_error(error).into_response(),
    }
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> impl IntoResponse {
    let (status, message) = match &error {
        AppError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AppError::NotFound { resource, id } => (
            StatusCode::NOT_FOUND,
            format!("{} with id '{}' not found", resource, id),
        ),
        AppError::Decode(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        AppError::Load(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        AppError::Remote(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        AppError::Http(_) => (
            StatusCode::BAD_GATEWAY,
            "External service communication failed".to_string(),
        ),
        AppError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Local storage operation failed".to_string(),
        ),
        AppError::Serialization(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Stored data could not be read".to_string(),
        ),
        AppError::Configuration { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Configuration error: {}", message),
        ),
        AppError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal error: {}", message),
        ),
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    } else {
        tracing::debug!("Request rejected: {}", error);
    }

    (status, Json(ApiResponse::<()>::error(message)))
}

/// Success response helpers
pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}
