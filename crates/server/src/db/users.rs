//! Account storage.
//!
//! Emails are unique case-insensitively (`lower(email)` index); roles are a
//! `TEXT[]` of role names.

use async_trait::async_trait;
use sqlx::PgPool;

use catalog_core::{Email, Role, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::Identity;

/// Storage for accounts and their password hashes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by email, ignoring case.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError>;

    /// Create an account.
    ///
    /// Returns `RepositoryError::Conflict` if the email (ignoring case) is taken.
    async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        roles: &[Role],
    ) -> Result<Identity, RepositoryError>;

    /// Replace an account's password hash.
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: i32,
    email: String,
    password_hash: String,
    roles: Vec<String>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = RepositoryError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let roles = row
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid role in database: {e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            password_hash: row.password_hash,
            roles,
        })
    }
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// `PostgreSQL`-backed [`CredentialStore`].
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new credential store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r"
            SELECT id, email, password_hash, roles
            FROM users
            WHERE lower(email) = $1
            ",
        )
        .bind(email.normalized())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Identity::try_from).transpose()
    }

    async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        roles: &[Role],
    ) -> Result<Identity, RepositoryError> {
        let role_names: Vec<&str> = roles.iter().map(Role::as_str).collect();

        let row = sqlx::query_as::<_, IdentityRow>(
            r"
            INSERT INTO users (email, password_hash, roles)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, roles
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(&role_names)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;

        Identity::try_from(row)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
