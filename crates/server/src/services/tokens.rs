//! Bearer token issuing and validation.
//!
//! Tokens are HS256 JWTs. They are not persisted and cannot be revoked: a token
//! stays valid until `exp` as long as the signing secret, issuer and audience
//! are unchanged.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use catalog_core::Role;

use crate::config::JwtConfig;
use crate::models::{CurrentUser, Identity};

/// Reasons a token is not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// No `Authorization: Bearer` header.
    #[error("missing bearer token")]
    Missing,

    /// Not a decodable JWT.
    #[error("malformed token")]
    Malformed,

    /// Signature does not verify under the configured key.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Issuer or audience mismatch, or a required claim is absent.
    #[error("invalid token claims")]
    InvalidClaims,

    /// `exp` is not in the future.
    #[error("token expired")]
    Expired,

    /// The token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account email.
    pub sub: String,
    pub name: String,
    pub email: String,
    pub jti: Uuid,
    #[serde(rename = "role")]
    pub roles: Vec<Role>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token and its timing.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates bearer tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenService {
    /// Build a token service from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against an explicit clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            lifetime: config.token_lifetime,
        }
    }

    /// Issue a token for `identity` valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token for `identity` as if the current time were `now`.
    ///
    /// Timestamps are truncated to whole seconds, matching the JWT encoding.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails or the expiry is out of range.
    pub fn issue_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let exp = iat + self.lifetime.num_seconds();
        let (issued_at, expires_at) = DateTime::from_timestamp(iat, 0)
            .zip(DateTime::from_timestamp(exp, 0))
            .ok_or_else(|| TokenError::Signing("timestamp out of range".to_owned()))?;

        let jti = Uuid::new_v4();
        let email = identity.email.as_str().to_owned();
        let claims = Claims {
            sub: email.clone(),
            name: email.clone(),
            email,
            jti,
            roles: identity.roles.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        tracing::debug!(user_id = %identity.id, %jti, %expires_at, "Issued bearer token");

        Ok(IssuedToken {
            token,
            jti,
            issued_at,
            expires_at,
        })
    }

    /// Validate a token against the current time.
    ///
    /// # Errors
    ///
    /// Returns the first `TokenError` the token fails on.
    pub fn validate(&self, token: &str) -> Result<CurrentUser, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// Signature is checked first, then issuer and audience, then expiry with
    /// zero leeway (`exp <= now` is expired).
    ///
    /// # Errors
    ///
    /// Returns the first `TokenError` the token fails on.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<CurrentUser, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::InvalidClaims)?;

        Ok(CurrentUser {
            email: claims.email,
            name: claims.name,
            roles: claims.roles,
            jti: claims.jti,
            expires_at,
        })
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ImmatureSignature => TokenError::InvalidClaims,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use catalog_core::{Email, UserId};
    use secrecy::SecretString;

    const SECRET: &str = "kV9#qL2!xW7@pR4$zT1^mN8&bH5*cJ3%";

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: SecretString::from(secret),
            issuer: "product-catalog".to_owned(),
            audience: "product-catalog-clients".to_owned(),
            token_lifetime: Duration::hours(3),
        }
    }

    fn identity() -> Identity {
        Identity {
            id: UserId::new(1),
            email: Email::parse("jane@example.com").unwrap(),
            password_hash: String::new(),
            roles: vec![Role::User],
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let service = TokenService::new(&config(SECRET));
        let now = Utc::now();
        let issued = service.issue_at(&identity(), now).unwrap();

        assert_eq!(issued.expires_at - issued.issued_at, Duration::hours(3));

        let user = service.validate_at(&issued.token, now).unwrap();
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.name, "jane@example.com");
        assert_eq!(user.roles, vec![Role::User]);
        assert_eq!(user.jti, issued.jti);
        assert_eq!(user.expires_at, issued.expires_at);
    }

    #[test]
    fn test_expiry_boundary() {
        let service = TokenService::new(&config(SECRET));
        let t = at(1_800_000_000);
        let issued = service.issue_at(&identity(), t).unwrap();

        let just_before = t + Duration::hours(2) + Duration::minutes(59);
        assert!(service.validate_at(&issued.token, just_before).is_ok());

        let just_after = t + Duration::hours(3) + Duration::minutes(1);
        assert_eq!(
            service.validate_at(&issued.token, just_after).unwrap_err(),
            TokenError::Expired
        );

        let exactly = t + Duration::hours(3);
        assert_eq!(
            service.validate_at(&issued.token, exactly).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_each_token_gets_unique_jti() {
        let service = TokenService::new(&config(SECRET));
        let now = Utc::now();
        let a = service.issue_at(&identity(), now).unwrap();
        let b = service.issue_at(&identity(), now).unwrap();
        assert_ne!(a.jti, b.jti);
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_different_secret_rejected() {
        let issuer = TokenService::new(&config(SECRET));
        let other = TokenService::new(&config("Zq8&wE3!rT6@yU1#iO4$pA7%sD0^fG2*"));
        let issued = issuer.issue(&identity()).unwrap();

        assert_eq!(
            other.validate(&issued.token).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let issuer = TokenService::new(&config(SECRET));
        let mut other_config = config(SECRET);
        other_config.audience = "someone-else".to_owned();
        let validator = TokenService::new(&other_config);

        let issued = issuer.issue(&identity()).unwrap();
        assert_eq!(
            validator.validate(&issued.token).unwrap_err(),
            TokenError::InvalidClaims
        );
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let issuer = TokenService::new(&config(SECRET));
        let mut other_config = config(SECRET);
        other_config.issuer = "another-service".to_owned();
        let validator = TokenService::new(&other_config);

        let issued = issuer.issue(&identity()).unwrap();
        assert_eq!(
            validator.validate(&issued.token).unwrap_err(),
            TokenError::InvalidClaims
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = TokenService::new(&config(SECRET));
        assert_eq!(
            service.validate("invalid.token.here").unwrap_err(),
            TokenError::Malformed
        );
        assert_eq!(service.validate("").unwrap_err(), TokenError::Malformed);
    }
}
