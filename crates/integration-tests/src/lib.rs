//! Integration tests for the product catalog API.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no external services)
//! cargo test -p catalog-integration-tests
//!
//! # Include repository tests against PostgreSQL
//! CATALOG_TEST_DATABASE_URL=postgres://... cargo test -p catalog-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Registration, login and password change
//! - `products` - Product CRUD over HTTP
//! - `request_gate` - Bearer token gating and the error envelope
//! - `pg_repositories` - `PostgreSQL` repositories (ignored by default)
//!
//! Every HTTP test drives the real router in-process through
//! [`tower::ServiceExt::oneshot`], backed by in-memory stores.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use catalog_server::config::{AppConfig, JwtConfig, LogFormat};
use catalog_server::db::memory::{InMemoryCredentialStore, InMemoryProductRepository};
use catalog_server::{AppState, app};

/// Signing secret used by every in-process test server.
pub const TEST_JWT_SECRET: &str = "kV9#qL2!xW7@pR4$zT1^mN8&bH5*cJ3%";

/// Password that satisfies the password policy.
pub const TEST_PASSWORD: &str = "Passw0rd";

/// Token settings for tests, signed with `secret`.
#[must_use]
pub fn jwt_config(secret: &str) -> JwtConfig {
    JwtConfig {
        secret: SecretString::from(secret.to_owned()),
        issuer: "product-catalog".to_owned(),
        audience: "product-catalog-clients".to_owned(),
        token_lifetime: chrono::Duration::minutes(180),
    }
}

/// Server configuration for tests. The database URL is never used.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://unused@localhost/unused".to_owned()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        jwt: jwt_config(TEST_JWT_SECRET),
        static_dir: None,
        log_format: LogFormat::Text,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A response captured from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// An in-process catalog server over fresh in-memory stores.
pub struct TestContext {
    pub router: Router,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Start a server with empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Start a server with custom configuration.
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::with_stores(
            config,
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryProductRepository::new()),
        );
        Self { router: app(state) }
    }

    /// Send a request and collect the response. Non-JSON bodies become
    /// `Value::String`, empty bodies `Value::Null`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET` without a token.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    /// Register an account.
    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": email,
                "password": password,
                "confirmPassword": password,
            })),
        )
        .await
    }

    /// Log in.
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register an account with [`TEST_PASSWORD`] and return a fresh token.
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails.
    pub async fn token_for(&self, email: &str) -> String {
        let registered = self.register(email, TEST_PASSWORD).await;
        assert_eq!(registered.status, StatusCode::OK, "{:?}", registered.body);

        let logged_in = self.login(email, TEST_PASSWORD).await;
        assert_eq!(logged_in.status, StatusCode::OK, "{:?}", logged_in.body);

        logged_in.body["token"]
            .as_str()
            .expect("login returns a token")
            .to_owned()
    }

    /// Create a product and return its JSON representation.
    ///
    /// # Panics
    ///
    /// Panics unless the server answers `201 Created`.
    pub async fn create_product(&self, token: &str, name: &str, price: f64) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/products",
                Some(token),
                Some(json!({ "name": name, "price": price })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }
}
