//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET` - Access token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 8000)
//! - `JWT_ACCESS_TTL_HOURS` - Access token lifetime (default: 24)
//! - `PRODUCT_BACKEND` - `local` or `woocommerce` (default: local)
//! - `WC_API_URL` - WooCommerce REST base URL (default: the production store)
//! - `WC_CONSUMER_KEY` / `WC_CONSUMER_SECRET` - Required when `PRODUCT_BACKEND=woocommerce`
//! - `TWILIO_ACCOUNT_SID` / `TWILIO_AUTH_TOKEN` / `TWILIO_SERVICE_SID` - SMS OTP via
//!   Twilio Verify (all three or none)
//! - `CORS_ALLOW_ALL` - Allow any origin (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_WC_API_URL: &str = "https://www.organicsabziwala.com/wp-json/wc/v3/";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "django-insecure",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where the catalog and order pipeline are sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommerceBackend {
    /// The local `PostgreSQL` catalog.
    #[default]
    Local,
    /// A WooCommerce store over its REST API.
    WooCommerce,
}

impl CommerceBackend {
    /// Value stored in `external_source` columns for this backend.
    #[must_use]
    pub const fn source_name(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::WooCommerce => "woocommerce",
        }
    }
}

impl FromStr for CommerceBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "woocommerce" | "wc" => Ok(Self::WooCommerce),
            other => Err(format!("expected 'local' or 'woocommerce', got '{other}'")),
        }
    }
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Access token settings
    pub jwt: JwtConfig,
    /// Active product/order backend
    pub backend: CommerceBackend,
    /// WooCommerce credentials, if configured
    pub woocommerce: Option<WooCommerceConfig>,
    /// Twilio Verify credentials; OTPs are logged locally when absent
    pub twilio: Option<TwilioConfig>,
    /// Allow cross-origin requests from any origin
    pub cors_allow_all: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// JWT access token configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC signing secret
    pub secret: SecretString,
    /// Access token lifetime in hours
    pub access_ttl_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl_hours", &self.access_ttl_hours)
            .finish()
    }
}

/// WooCommerce REST API configuration.
#[derive(Clone)]
pub struct WooCommerceConfig {
    /// Base URL ending in `/wc/v3/`
    pub api_url: Url,
    /// Consumer key (basic auth user)
    pub consumer_key: String,
    /// Consumer secret (basic auth password)
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for WooCommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooCommerceConfig")
            .field("api_url", &self.api_url.as_str())
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

/// Twilio Verify configuration.
#[derive(Clone)]
pub struct TwilioConfig {
    /// Account SID (basic auth user)
    pub account_sid: String,
    /// Auth token (basic auth password)
    pub auth_token: SecretString,
    /// Verify service SID
    pub service_sid: String,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("service_sid", &self.service_sid)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("API_DATABASE_URL")?;
        let host = parse_env("API_HOST", "127.0.0.1")?;
        let port = parse_env("API_PORT", "8000")?;

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;
        let jwt = JwtConfig {
            secret: jwt_secret,
            access_ttl_hours: parse_env("JWT_ACCESS_TTL_HOURS", "24")?,
        };

        let backend: CommerceBackend = parse_env("PRODUCT_BACKEND", "local")?;
        let woocommerce = WooCommerceConfig::from_env()?;
        if backend == CommerceBackend::WooCommerce && woocommerce.is_none() {
            return Err(ConfigError::MissingEnvVar("WC_CONSUMER_KEY".to_string()));
        }

        let twilio = TwilioConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            backend,
            woocommerce,
            twilio,
            cors_allow_all: parse_env("CORS_ALLOW_ALL", "true")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl WooCommerceConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(consumer_key), Some(consumer_secret)) = (
            get_optional_env("WC_CONSUMER_KEY"),
            get_optional_env("WC_CONSUMER_SECRET"),
        ) else {
            return Ok(None);
        };

        let raw_url = get_env_or_default("WC_API_URL", DEFAULT_WC_API_URL);
        Ok(Some(Self {
            api_url: parse_base_url(&raw_url, "WC_API_URL")?,
            consumer_key,
            consumer_secret: SecretString::from(consumer_secret),
        }))
    }
}

impl TwilioConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("TWILIO_ACCOUNT_SID"),
            get_optional_env("TWILIO_AUTH_TOKEN"),
            get_optional_env("TWILIO_SERVICE_SID"),
        ) {
            (Some(account_sid), Some(auth_token), Some(service_sid)) => Ok(Some(Self {
                account_sid,
                auth_token: SecretString::from(auth_token),
                service_sid,
            })),
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "TWILIO_*".to_string(),
                "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_SERVICE_SID must be set together"
                    .to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL, ensuring a trailing slash so relative joins append.
fn parse_base_url(raw: &str, key: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("01") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_django_default_key_rejected() {
        let err = validate_secret_strength("django-insecure-k3j4h5g6f7d8s9a0", "JWT_SECRET")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_low_entropy_rejected() {
        assert!(validate_secret_strength(&"ab".repeat(20), "JWT_SECRET").is_err());
    }

    #[test]
    fn test_random_secret_accepted() {
        assert!(validate_secret_strength("Qm7#vT2@pL9!xR4$wZ1^kN8&hB5*dF3", "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let secret = SecretString::from("Qm7#vT2@");
        assert!(validate_secret_length(&secret, "JWT_SECRET").is_err());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("LOCAL".parse(), Ok(CommerceBackend::Local));
        assert_eq!(" woocommerce ".parse(), Ok(CommerceBackend::WooCommerce));
        assert!("magento".parse::<CommerceBackend>().is_err());
        assert_eq!(CommerceBackend::WooCommerce.source_name(), "woocommerce");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("https://shop.test/wp-json/wc/v3", "WC_API_URL").unwrap();
        assert_eq!(url.join("orders").unwrap().as_str(), "https://shop.test/wp-json/wc/v3/orders");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let wc = WooCommerceConfig {
            api_url: Url::parse("https://shop.test/wp-json/wc/v3/").unwrap(),
            consumer_key: "ck_visible".to_string(),
            consumer_secret: SecretString::from("cs_hidden_value"),
        };
        let twilio = TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: SecretString::from("hidden_token"),
            service_sid: "VA456".to_string(),
        };
        let jwt = JwtConfig {
            secret: SecretString::from("hidden_jwt"),
            access_ttl_hours: 24,
        };

        let output = format!("{wc:?} {twilio:?} {jwt:?}");
        assert!(output.contains("ck_visible"));
        assert!(output.contains("AC123"));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("cs_hidden_value"));
        assert!(!output.contains("hidden_token"));
        assert!(!output.contains("hidden_jwt"));
    }
}
