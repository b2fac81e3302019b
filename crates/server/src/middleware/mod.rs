//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions) - added in `main`
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (any origin, method and header)
//! 5. Authentication (record bearer token outcome)
//! 6. Security headers (API routes only)

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{Authentication, OptionalAuth, RequireAuth, authenticate, bearer_token};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
