//! Command implementations.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Read the database URL the server itself would use.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("CATALOG_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
