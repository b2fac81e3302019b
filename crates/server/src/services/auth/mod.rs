//! Authentication service.
//!
//! Registration, login and password change on top of a [`CredentialStore`].
//! Passwords are hashed with Argon2id; login hands back a bearer token from
//! the [`TokenService`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use catalog_core::{Email, Role};

use crate::db::{CredentialStore, RepositoryError};
use crate::models::{CurrentUser, Identity};
use crate::services::tokens::{IssuedToken, TokenService};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn CredentialStore,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn CredentialStore, tokens: &'a TokenService) -> Self {
        Self { users, tokens }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new account with the `User` role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` or `AuthError::InvalidEmail` for bad input.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    /// Returns `AuthError::CreationRejected` if the password doesn't meet requirements.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Identity, AuthError> {
        let email = parse_email(email)?;
        require("Password", password)?;

        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let identity = create_account(self.users, &email, password, &[Role::User]).await?;

        tracing::info!(user_id = %identity.id, "User registered");
        Ok(identity)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Verify credentials and issue a bearer token.
    ///
    /// An unknown email and a wrong password produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let email = parse_email(email)?;
        require("Password", password)?;

        let Some(identity) = self.users.find_by_email(&email).await? else {
            tracing::info!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if verify_password(password, &identity.password_hash).is_err() {
            tracing::info!(user_id = %identity.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&identity)?;
        tracing::info!(user_id = %identity.id, jti = %issued.jti, "User logged in");
        Ok(issued)
    }

    // =========================================================================
    // Password Change
    // =========================================================================

    /// Replace the caller's password.
    ///
    /// Tokens issued before the change stay valid until they expire.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NewPasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the new password doesn't meet requirements.
    /// Returns `AuthError::CurrentPasswordRejected` if the current password is
    /// wrong or the account no longer exists.
    pub async fn change_password(
        &self,
        user: &CurrentUser,
        current_password: &str,
        new_password: &str,
        confirm_new_password: &str,
    ) -> Result<(), AuthError> {
        require("Current password", current_password)?;
        require("New password", new_password)?;

        if new_password != confirm_new_password {
            return Err(AuthError::NewPasswordMismatch);
        }

        validate_password(new_password)?;

        let email = Email::parse(&user.email).map_err(|_| AuthError::CurrentPasswordRejected)?;
        let identity = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::CurrentPasswordRejected)?;

        verify_password(current_password, &identity.password_hash)
            .map_err(|_| AuthError::CurrentPasswordRejected)?;

        let password_hash = hash_password(new_password)?;
        match self
            .users
            .update_password_hash(identity.id, &password_hash)
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(AuthError::CurrentPasswordRejected),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %identity.id, "Password changed");
        Ok(())
    }
}

/// Create an account with the given roles after checking the password policy.
///
/// Used by registration and by the CLI, which may grant `Admin`.
///
/// # Errors
///
/// Returns `AuthError::UserAlreadyExists` if the email is already registered,
/// checked before the password policy.
/// Returns `AuthError::CreationRejected` if the password doesn't meet requirements.
pub async fn create_account(
    users: &dyn CredentialStore,
    email: &Email,
    password: &str,
    roles: &[Role],
) -> Result<Identity, AuthError> {
    if users.find_by_email(email).await?.is_some() {
        return Err(AuthError::UserAlreadyExists);
    }

    validate_password(password).map_err(|e| match e {
        AuthError::WeakPassword(problems) => AuthError::CreationRejected(problems),
        other => other,
    })?;
    let password_hash = hash_password(password)?;

    // The store still rejects a duplicate created concurrently.
    users
        .create(email, &password_hash, roles)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
}

// =============================================================================
// Helpers
// =============================================================================

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(())
}

fn parse_email(email: &str) -> Result<Email, AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::MissingField("Email"));
    }
    Ok(Email::parse(email)?)
}

/// Validate password meets requirements.
///
/// Every unmet rule is reported, not just the first.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "Passwords must be at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("Passwords must have at least one digit ('0'-'9').".to_owned());
    }
    if !password.chars().any(char::is_lowercase) {
        problems.push("Passwords must have at least one lowercase ('a'-'z').".to_owned());
    }
    if !password.chars().any(char::is_uppercase) {
        problems.push("Passwords must have at least one uppercase ('A'-'Z').".to_owned());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AuthError::WeakPassword(problems.join(", ")))
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
