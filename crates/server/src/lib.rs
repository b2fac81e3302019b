//! Product catalog server library.
//!
//! The HTTP API lives here so integration tests can drive the real router
//! in-process; `main.rs` only wires configuration, telemetry and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use routes::app;
pub use state::AppState;
