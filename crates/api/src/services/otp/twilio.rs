//! Twilio Verify OTP provider.
//!
//! See <https://www.twilio.com/docs/verify/api/verification>.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use sabzi_core::PhoneNumber;

use super::{OtpError, OtpProvider};
use crate::config::TwilioConfig;

const VERIFY_BASE_URL: &str = "https://verify.twilio.com/v2/Services";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct VerificationCheck {
    status: String,
}

/// Sends codes by SMS through a Twilio Verify service.
#[derive(Clone)]
pub struct TwilioOtpProvider {
    client: reqwest::Client,
    account_sid: String,
    auth_token: SecretString,
    service_sid: String,
}

impl TwilioOtpProvider {
    /// Build a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::Http` if the HTTP client cannot be built.
    pub fn new(config: &TwilioConfig) -> Result<Self, OtpError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            service_sid: config.service_sid.clone(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{VERIFY_BASE_URL}/{}/{resource}", self.service_sid)
    }

    async fn post_form(
        &self,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, OtpError> {
        let response = self
            .client
            .post(self.url(resource))
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(form)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl OtpProvider for TwilioOtpProvider {
    #[instrument(skip(self), fields(phone = %phone))]
    async fn send(&self, phone: &PhoneNumber) -> Result<(), OtpError> {
        let response = self
            .post_form("Verifications", &[("To", phone.as_str()), ("Channel", "sms")])
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Twilio rejected verification");
        Err(OtpError::SendFailed(format!("Twilio returned {status}")))
    }

    #[instrument(skip(self, code), fields(phone = %phone))]
    async fn check(&self, phone: &PhoneNumber, code: &str) -> Result<bool, OtpError> {
        let response = self
            .post_form("VerificationCheck", &[("To", phone.as_str()), ("Code", code)])
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Twilio verification check failed");
            return Err(OtpError::CheckFailed(format!("Twilio returned {status}")));
        }

        let check: VerificationCheck = response.json().await?;
        Ok(check.status == "approved")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_urls() {
        let provider = TwilioOtpProvider::new(&TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: SecretString::from("token".to_string()),
            service_sid: "VA456".to_string(),
        });
        let Ok(provider) = provider else {
            panic!("client should build");
        };
        assert_eq!(
            provider.url("Verifications"),
            "https://verify.twilio.com/v2/Services/VA456/Verifications"
        );
        assert_eq!(
            provider.url("VerificationCheck"),
            "https://verify.twilio.com/v2/Services/VA456/VerificationCheck"
        );
    }
}
