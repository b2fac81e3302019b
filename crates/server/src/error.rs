//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server faults to Sentry
//! before responding to the client. Product and gate failures are rendered as
//! an error envelope:
//!
//! ```json
//! { "error": { "message": "...", "type": "NotFoundError", "timestamp": "..." } }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{ProductError, TokenError};

/// Message shown to clients in place of internal error details.
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred while processing your request";

/// Application-level error type for the catalog API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Request body or parameters failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request conflicts with a business rule.
    #[error("Business rule violated: {0}")]
    Business(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] TokenError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(rename = "type")]
    kind: &'a str,
    timestamp: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Business(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error category reported in the envelope's `type` field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Business(_) => "BusinessError",
            Self::Unauthorized(_) => "AuthError",
            Self::NotFound(_) => "NotFoundError",
            Self::Database(_) | Self::Internal(_) => "InternalError",
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_owned(),
            Self::Unauthorized(e) => format!("Unauthorized: {e}"),
            Self::Validation(msg) | Self::Business(msg) | Self::NotFound(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorEnvelope {
            error: ErrorBody {
                message: self.client_message(),
                kind: self.kind(),
                timestamp: Utc::now().to_rfc3339(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Validation(problems) => Self::Validation(problems.join(", ")),
            ProductError::DuplicateName(_) => Self::Business(err.to_string()),
            ProductError::NotFound(_) => Self::NotFound(err.to_string()),
            ProductError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}
