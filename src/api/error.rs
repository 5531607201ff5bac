//! API error type and its JSON rendering.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the HTTP handlers.
///
/// Every variant renders as `{"error": <code>, "message": ..., "detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown id (404)
    #[error("{resource} with id {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// Bad or out-of-range request parameter (422)
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Storage failure (500)
    #[error("Database query failed")]
    Database(#[from] rusqlite::Error),

    /// Any other server-side failure (500)
    #[error("{0}")]
    Internal(String),

    /// Health check failed (503)
    #[error("Database connection failed")]
    Unavailable(#[source] rusqlite::Error),
}

impl ApiError {
    pub fn snp_not_found(id: i64) -> Self {
        Self::NotFound { resource: "SNP", id }
    }

    /// A validation error on a named query parameter.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation_error",
            Self::Database(_) | Self::Internal(_) => "internal_error",
            Self::Unavailable(_) => "service_unavailable",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::Validation { field, .. } => field.as_ref().map(|f| format!("field: {}", f)),
            Self::Unavailable(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation {
            message: rejection.body_text(),
            field: None,
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation {
            message: rejection.body_text(),
            field: None,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Database(e) => tracing::error!(error = %e, "database query failed"),
            Self::Internal(_) | Self::Unavailable(_) => tracing::error!(error = %self, "API error"),
            _ => tracing::warn!(error = %self, "API error"),
        }

        let body = ErrorResponse {
            error: self.error_code(),
            message: self.to_string(),
            detail: self.detail(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
