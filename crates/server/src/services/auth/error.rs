//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::tokens::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] catalog_core::EmailError),

    /// A required request field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Registration password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// New password and its confirmation differ.
    #[error("new passwords do not match")]
    NewPasswordMismatch,

    /// Password does not satisfy the policy.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Account creation refused by the password policy.
    #[error("user creation failed: {0}")]
    CreationRejected(String),

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Current password wrong, or the account behind the token is gone.
    #[error("current password rejected")]
    CurrentPasswordRejected,

    /// Token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// HTTP status reported to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail(_)
            | Self::MissingField(_)
            | Self::PasswordMismatch
            | Self::NewPasswordMismatch
            | Self::WeakPassword(_)
            | Self::CreationRejected(_)
            | Self::UserAlreadyExists => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::CurrentPasswordRejected => StatusCode::UNAUTHORIZED,
            Self::Token(_) | Self::Repository(_) | Self::PasswordHash => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Server faults get a generic message.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidEmail(e) => format!("Invalid email address: {e}"),
            Self::MissingField(field) => format!("{field} is required"),
            Self::PasswordMismatch => "Passwords do not match!".to_owned(),
            Self::NewPasswordMismatch => "New passwords do not match!".to_owned(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::CreationRejected(msg) => format!("User creation failed: {msg}"),
            Self::UserAlreadyExists => "User already exists!".to_owned(),
            Self::InvalidCredentials => "Invalid email or password!".to_owned(),
            Self::CurrentPasswordRejected => "Failed to change password".to_owned(),
            Self::Token(_) | Self::Repository(_) | Self::PasswordHash => {
                "An error occurred while processing your request".to_owned()
            }
        }
    }

    /// Whether this is a server fault rather than a client mistake.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Token(_) | Self::Repository(_) | Self::PasswordHash)
    }
}
