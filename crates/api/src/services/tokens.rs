//! JWT access tokens.
//!
//! Tokens are HS256-signed and carry enough of the user to authorize a
//! request without a database round trip.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sabzi_core::{UserId, UserRole};

use crate::config::JwtConfig;
use crate::models::User;

/// Errors from issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// Signature, expiry or shape check failed.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: UserId,
    pub phone: String,
    /// Warehouse access (staff flag or a warehouse role).
    pub is_staff: bool,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(config.access_ttl_hours),
        }
    }

    /// Sign an access token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            phone: user.phone_number.to_string(),
            is_staff: user.is_warehouse_staff(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Encode)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use sabzi_core::PhoneNumber;
    use secrecy::SecretString;

    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: SecretString::from(secret.to_string()),
            access_ttl_hours: 24,
        })
    }

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(42),
            phone_number: PhoneNumber::parse("+919812345678").unwrap(),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            is_phone_verified: true,
            wallet_balance: Decimal::ZERO,
            role,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("a-very-long-test-secret-with-enough-entropy-123");
        let token = tokens.issue(&user(UserRole::Customer)).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, UserId::new(42));
        assert_eq!(claims.phone, "+919812345678");
        assert!(!claims.is_staff);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_picker_role_is_staff() {
        let tokens = service("a-very-long-test-secret-with-enough-entropy-123");
        let token = tokens.issue(&user(UserRole::Picker)).unwrap();
        assert!(tokens.verify(&token).unwrap().is_staff);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let issuer = service("a-very-long-test-secret-with-enough-entropy-123");
        let verifier = service("another-long-secret-that-does-not-match-456");
        let token = issuer.issue(&user(UserRole::Customer)).unwrap();
        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        let tokens = service("a-very-long-test-secret-with-enough-entropy-123");
        assert!(tokens.verify("not.a.token").is_err());
    }
}
