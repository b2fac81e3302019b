//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a regular user (password read from CATALOG_USER_PASSWORD)
//! CATALOG_USER_PASSWORD='S3cretPass' catalog-cli user create -e jane@example.com
//!
//! # Create an administrator
//! catalog-cli user create -e admin@example.com -p 'S3cretPass' -r admin -r user
//! ```

use catalog_core::{Email, EmailError, Role, RoleError};
use catalog_server::db::PgCredentialStore;
use catalog_server::services::{AuthError, create_account};
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid role.
    #[error("{0}. Valid roles: user, admin")]
    InvalidRole(#[from] RoleError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Account could not be created.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Parse role names, defaulting to `User` when none are given.
fn parse_roles(names: &[String]) -> Result<Vec<Role>, RoleError> {
    let mut roles = names
        .iter()
        .map(|name| name.parse::<Role>())
        .collect::<Result<Vec<_>, _>>()?;

    if roles.is_empty() {
        roles.push(Role::User);
    }
    roles.sort();
    roles.dedup();
    Ok(roles)
}

/// Create a user with the given roles.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create(email: &str, password: &str, roles: &[String]) -> Result<i32, UserError> {
    let email = Email::parse(email)?;
    let roles = parse_roles(roles)?;

    let database_url =
        super::database_url().ok_or(UserError::MissingEnvVar("CATALOG_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = catalog_server::db::create_pool(&database_url).await?;
    let store = PgCredentialStore::new(pool);

    let identity = create_account(&store, &email, password, &roles).await?;

    tracing::info!(
        user_id = %identity.id,
        email = %identity.email,
        roles = ?identity.roles,
        "User created"
    );
    Ok(identity.id.as_i32())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles_defaults_to_user() {
        assert_eq!(parse_roles(&[]).unwrap(), vec![Role::User]);
    }

    #[test]
    fn test_parse_roles_dedups() {
        let names = vec!["Admin".to_owned(), "admin".to_owned(), "user".to_owned()];
        assert_eq!(parse_roles(&names).unwrap(), vec![Role::User, Role::Admin]);
    }

    #[test]
    fn test_parse_roles_rejects_unknown() {
        assert!(parse_roles(&["root".to_owned()]).is_err());
    }
}
