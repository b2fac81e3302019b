//! Database access for the product catalog.
//!
//! # Tables
//!
//! - `users` - Accounts (email, argon2 password hash, role names)
//! - `products` - Catalog entries, soft-deleted through `is_active`
//!
//! Storage is reached through the [`CredentialStore`] and [`ProductRepository`]
//! traits so handlers never see a connection pool. `PostgreSQL` implementations
//! live in [`users`] and [`products`]; [`memory`] holds in-process stores used
//! by tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/`, embedded in the binary
//! and applied on startup by [`initialize`]. They can also be run on their own:
//! ```bash
//! cargo run -p catalog-cli -- migrate
//! ```

pub mod memory;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use products::{PgProductRepository, ProductRepository};
pub use users::{CredentialStore, PgCredentialStore};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Number of schema initialization attempts before startup gives up.
pub const INIT_ATTEMPTS: u32 = 3;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid or corrupted.
    #[error("data integrity error: {0}")]
    DataCorruption(String),

    /// Record not found.
    #[error("record not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised while bringing the schema up at startup.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the applied history diverges.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Connect, migrate and verify the database, retrying on failure.
///
/// Makes up to [`INIT_ATTEMPTS`] attempts. Before attempt `n > 1` it sleeps
/// `n` seconds. The last attempt's error is returned if every attempt fails.
///
/// # Errors
///
/// Returns `InitError` from the final failed attempt.
pub async fn initialize(database_url: &SecretString) -> Result<PgPool, InitError> {
    let mut attempt = 1;
    loop {
        match try_initialize(database_url).await {
            Ok(pool) => {
                tracing::info!(attempt, "Database schema initialized");
                return Ok(pool);
            }
            Err(e) if attempt < INIT_ATTEMPTS => {
                tracing::warn!(attempt, error = %e, "Database initialization failed, retrying");
                attempt += 1;
                tokio::time::sleep(retry_delay(attempt)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn try_initialize(database_url: &SecretString) -> Result<PgPool, InitError> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// Delay before the given (1-based) attempt.
fn retry_delay(attempt: u32) -> Duration {
    if attempt <= 1 {
        Duration::ZERO
    } else {
        Duration::from_secs(u64::from(attempt))
    }
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
