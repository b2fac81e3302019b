//! HTTP routes for the catalog API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness check
//! GET    /health/ready          - Readiness check (database)
//!
//! # Auth
//! POST   /api/auth/register       - Create an account
//! POST   /api/auth/login          - Exchange credentials for a bearer token
//! PUT    /api/auth/changepassword - Change password (requires auth)
//!
//! # Products
//! GET    /api/products          - List active products
//! GET    /api/products/{id}     - Get one active product
//! POST   /api/products          - Create a product (requires auth)
//! PUT    /api/products/{id}     - Update a product (requires auth)
//! DELETE /api/products/{id}     - Soft-delete a product (requires auth)
//! ```
//!
//! When a static directory is configured, any other path is served from it
//! with `index.html` as the fallback so client-side routing works.

pub mod auth;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::{HeaderName, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{authenticate, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Build the complete application router.
///
/// Sentry layers are not included; the binary adds them outermost.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api_routes());

    if let Some(dir) = &state.config().static_dir {
        let index = dir.join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([HeaderName::from_static(
                    crate::middleware::request_id::REQUEST_ID_HEADER,
                )]),
        )
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                        request_id = tracing::field::Empty,
                        user_email = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// JSON API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/changepassword", put(auth::change_password))
        .route(
            "/api/products",
            get(products::list).post(products::create),
        )
        .route(
            "/api/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/api/{*rest}", any(api_not_found))
        .layer(from_fn(security_headers_middleware))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Unknown API paths get a JSON 404 instead of the client fallback.
async fn api_not_found() -> AppError {
    AppError::NotFound("Resource not found.".to_owned())
}
