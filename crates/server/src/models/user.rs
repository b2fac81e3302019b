//! Account domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use catalog_core::{Email, Role, UserId};

/// A stored account (domain type).
///
/// Implements `Debug` manually to redact the password hash.
#[derive(Clone)]
pub struct Identity {
    /// Unique user ID.
    pub id: UserId,
    /// Email address as first registered.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Granted roles, never empty for accounts created through registration.
    pub roles: Vec<Role>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("roles", &self.roles)
            .finish()
    }
}

/// The caller of an authenticated request, built from validated token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Email from the token's `email` claim.
    pub email: String,
    /// Display name from the token's `name` claim.
    pub name: String,
    /// Roles from the token's `role` claim.
    pub roles: Vec<Role>,
    /// Token identifier.
    pub jti: Uuid,
    /// When the presented token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_debug_redacts_hash() {
        let identity = Identity {
            id: UserId::new(1),
            email: Email::parse("user@example.com").unwrap(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
            roles: vec![Role::User],
        };

        let debug_output = format!("{identity:?}");
        assert!(debug_output.contains("user@example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("argon2id"));
    }
}
