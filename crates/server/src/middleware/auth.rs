//! Bearer token authentication middleware and extractors.
//!
//! [`authenticate`] runs on every request and records the outcome of token
//! validation in the request extensions. Handlers opt in to gating with the
//! [`RequireAuth`] extractor; public handlers omit it or use [`OptionalAuth`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::TokenError;
use crate::state::AppState;

/// Outcome of bearer token validation for the current request.
#[derive(Debug, Clone)]
pub struct Authentication(pub Result<CurrentUser, TokenError>);

/// Middleware that validates the bearer token, if any, and records the result.
///
/// Never rejects a request itself; rejection is up to [`RequireAuth`].
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = bearer_token(request.headers()).and_then(|token| state.tokens().validate(token));

    match &outcome {
        Ok(user) => {
            Span::current().record("user_email", user.email.as_str());
            set_sentry_user(&user.email);
        }
        Err(TokenError::Missing) => {}
        Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
    }

    request.extensions_mut().insert(Authentication(outcome));
    next.run(request).await
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// Returns `TokenError::Missing` if there is no header or it uses another
/// scheme, `TokenError::Malformed` if the header is not valid text or carries
/// no token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(TokenError::Missing)?
        .to_str()
        .map_err(|_| TokenError::Malformed)?;

    let (scheme, token) = value.trim().split_once(' ').unwrap_or((value.trim(), ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(TokenError::Missing);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Malformed);
    }
    Ok(token)
}

/// Extractor that requires a valid bearer token.
///
/// Rejects with `401` and the error envelope if the token is missing or
/// invalid.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Authentication>() {
            Some(Authentication(Ok(user))) => Ok(Self(user.clone())),
            Some(Authentication(Err(e))) => Err(AppError::Unauthorized(e.clone())),
            None => Err(AppError::Unauthorized(TokenError::Missing)),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the token is
/// missing or invalid.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Authentication>() {
            Some(Authentication(Ok(user))) => Some(user.clone()),
            _ => None,
        };

        Ok(Self(user))
    }
}
