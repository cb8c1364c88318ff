//! Phone number login by one-time code.
//!
//! Codes are delivered and checked by an [`OtpProvider`]: Twilio Verify when
//! credentials are configured, otherwise [`ConsoleOtpProvider`], which logs
//! codes for local development. A fixed set of test numbers bypasses the
//! provider entirely.

mod console;
mod twilio;

pub use console::ConsoleOtpProvider;
pub use twilio::TwilioOtpProvider;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use sabzi_core::{PhoneNumber, PhoneNumberError};

use crate::db::{RepositoryError, UserRepository};
use crate::models::UserProfile;
use crate::services::tokens::{TokenError, TokenService};

/// Numbers that always accept [`TEST_CODE`] and never reach the provider.
pub const TEST_NUMBERS: [&str; 2] = ["+919998887776", "+919999999999"];

/// Code accepted for [`TEST_NUMBERS`].
pub const TEST_CODE: &str = "123456";

/// Errors from sending or checking a code.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneNumberError),

    /// The provider rejected the code.
    #[error("Invalid OTP")]
    InvalidCode,

    /// The provider refused to send a code.
    #[error("failed to send OTP: {0}")]
    SendFailed(String),

    /// The provider could not check the code.
    #[error("Verification Failed")]
    CheckFailed(String),

    #[error("SMS provider unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Delivers and checks one-time codes.
#[async_trait]
pub trait OtpProvider: Send + Sync {
    /// Send a fresh code to `phone`.
    async fn send(&self, phone: &PhoneNumber) -> Result<(), OtpError>;

    /// Check `code` against the last one sent to `phone`.
    ///
    /// Returns `false` when the code is wrong or expired.
    async fn check(&self, phone: &PhoneNumber, code: &str) -> Result<bool, OtpError>;
}

/// Whether `phone` is one of the fixed test numbers.
#[must_use]
pub fn is_test_number(phone: &PhoneNumber) -> bool {
    TEST_NUMBERS.contains(&phone.as_str())
}

/// Result of a successful code check.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserProfile,
}

/// OTP login flow.
pub struct OtpService<'a> {
    provider: &'a dyn OtpProvider,
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> OtpService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        provider: &'a dyn OtpProvider,
        tokens: &'a TokenService,
    ) -> Self {
        Self {
            provider,
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Send a login code; returns the message shown to the user.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::InvalidPhone` for malformed numbers, or the
    /// provider's error if sending fails.
    #[instrument(skip(self))]
    pub async fn send_code(&self, raw_phone: &str) -> Result<&'static str, OtpError> {
        let phone = PhoneNumber::parse(raw_phone)?;

        if is_test_number(&phone) {
            return Ok("OTP sent successfully (Test)");
        }

        self.provider.send(&phone).await?;
        tracing::info!(phone = %phone, "OTP sent");
        Ok("OTP sent successfully")
    }

    /// Check a login code and sign the user in.
    ///
    /// The account is created on first login. Test numbers are granted staff
    /// and superuser access.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::InvalidCode` when the code is wrong, or the
    /// provider, repository or token error otherwise.
    #[instrument(skip(self, code))]
    pub async fn verify_code(&self, raw_phone: &str, code: &str) -> Result<LoginResponse, OtpError> {
        let phone = PhoneNumber::parse(raw_phone)?;
        let code = code.trim();

        let is_test = is_test_number(&phone) && code == TEST_CODE;
        if !is_test && !self.provider.check(&phone, code).await? {
            return Err(OtpError::InvalidCode);
        }

        let user = self.users.get_or_create(&phone).await?;
        let mut user = self.users.mark_phone_verified(user.id).await?;
        if is_test {
            user = self.users.grant_superuser(user.id).await?;
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            message: if is_test {
                "Login Successful (Test)"
            } else {
                "Login Successful"
            },
            token,
            user: user.into(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_match_after_normalization() {
        assert!(is_test_number(&PhoneNumber::parse("9998887776").unwrap()));
        assert!(is_test_number(&PhoneNumber::parse("+91 99999 99999").unwrap()));
        assert!(!is_test_number(&PhoneNumber::parse("9876543210").unwrap()));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(OtpError::InvalidCode.to_string(), "Invalid OTP");
        assert_eq!(
            OtpError::CheckFailed("404".to_string()).to_string(),
            "Verification Failed"
        );
    }
}
