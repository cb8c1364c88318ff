//! Development OTP provider.
//!
//! Codes are written to the log instead of being sent by SMS and expire after
//! ten minutes.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rand::Rng;

use sabzi_core::PhoneNumber;

use super::{OtpError, OtpProvider};

const CODE_TTL: Duration = Duration::from_secs(600);

/// Logs codes and keeps them in memory.
#[derive(Clone)]
pub struct ConsoleOtpProvider {
    codes: Cache<PhoneNumber, String>,
}

impl ConsoleOtpProvider {
    #[must_use]
    pub fn new() -> Self {
        let codes = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(CODE_TTL)
            .build();
        Self { codes }
    }
}

impl Default for ConsoleOtpProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

#[async_trait]
impl OtpProvider for ConsoleOtpProvider {
    async fn send(&self, phone: &PhoneNumber) -> Result<(), OtpError> {
        let code = generate_code();
        tracing::info!(phone = %phone, code = %code, "OTP generated (console provider)");
        self.codes.insert(phone.clone(), code).await;
        Ok(())
    }

    async fn check(&self, phone: &PhoneNumber, code: &str) -> Result<bool, OtpError> {
        match self.codes.get(phone).await {
            Some(expected) if expected == code => {
                self.codes.invalidate(phone).await;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let provider = ConsoleOtpProvider::new();
        let phone = PhoneNumber::parse("9876543210").unwrap();

        provider.send(&phone).await.unwrap();
        let code = provider.codes.get(&phone).await.unwrap();

        assert!(!provider.check(&phone, "000000").await.unwrap());
        assert!(provider.check(&phone, &code).await.unwrap());
        assert!(!provider.check(&phone, &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_number_rejected() {
        let provider = ConsoleOtpProvider::new();
        let phone = PhoneNumber::parse("9876500000").unwrap();
        assert!(!provider.check(&phone, "123456").await.unwrap());
    }
}
