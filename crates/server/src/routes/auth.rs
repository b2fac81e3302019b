//! Account route handlers.
//!
//! These endpoints report their own failures as `{ "success": false, "message" }`
//! so the browser client can show `message` directly. Gate rejections on
//! `changepassword` still use the standard error envelope.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::INTERNAL_ERROR_MESSAGE;
use crate::middleware::RequireAuth;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Request and Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Response body for every account endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthResponse {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_owned(),
            token: None,
            expires_at: None,
        }
    }
}

/// Failure response for account endpoints.
#[derive(Debug)]
pub struct AuthFailure {
    status: StatusCode,
    message: String,
}

impl From<AuthError> for AuthFailure {
    fn from(err: AuthError) -> Self {
        if err.is_internal() {
            let event_id = sentry::capture_error(&err);
            tracing::error!(
                error = %err,
                sentry_event_id = %event_id,
                "Account request error"
            );
        }

        Self {
            status: err.status(),
            message: err.client_message(),
        }
    }
}

impl From<JsonRejection> for AuthFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        let body = AuthResponse {
            success: false,
            message: if self.status.is_server_error() {
                INTERNAL_ERROR_MESSAGE.to_owned()
            } else {
                self.message
            },
            token: None,
            expires_at: None,
        };
        (self.status, Json(body)).into_response()
    }
}

type AuthResult = Result<Json<AuthResponse>, AuthFailure>;

// =============================================================================
// Handlers
// =============================================================================

/// Create an account with the `User` role.
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult {
    let Json(req) = body?;

    AuthService::new(state.users(), state.tokens())
        .register(&req.email, &req.password, &req.confirm_password)
        .await?;

    Ok(Json(AuthResponse::ok("User created successfully!")))
}

/// Exchange credentials for a bearer token.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult {
    let Json(req) = body?;

    let issued = AuthService::new(state.users(), state.tokens())
        .login(&req.email, &req.password)
        .await?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful!".to_owned(),
        token: Some(issued.token),
        expires_at: Some(issued.expires_at),
    }))
}

/// Change the caller's password.
#[tracing::instrument(skip_all, fields(email = %user.email))]
pub async fn change_password(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AuthResult {
    let Json(req) = body?;

    AuthService::new(state.users(), state.tokens())
        .change_password(
            &user,
            &req.current_password,
            &req.new_password,
            &req.confirm_new_password,
        )
        .await?;

    Ok(Json(AuthResponse::ok("Password changed successfully")))
}
