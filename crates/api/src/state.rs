//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::commerce::{Adapters, CommerceError, OrderAdapter, ProductAdapter, WooCommerceClient};
use crate::config::ApiConfig;
use crate::services::otp::{ConsoleOtpProvider, OtpError, OtpProvider, TwilioOtpProvider};
use crate::services::tokens::TokenService;

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("commerce backend: {0}")]
    Commerce(#[from] CommerceError),
    #[error("OTP provider: {0}")]
    Otp(#[from] OtpError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    adapters: Adapters,
    tokens: TokenService,
    otp: Arc<dyn OtpProvider>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Builds the commerce adapters for the configured backend and picks
    /// Twilio for OTPs when it is configured, the console provider otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter or the OTP provider cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let adapters = crate::commerce::build_adapters(&config, pool.clone())?;
        let otp: Arc<dyn OtpProvider> = match &config.twilio {
            Some(twilio) => Arc::new(TwilioOtpProvider::new(twilio)?),
            None => {
                tracing::warn!("Twilio not configured; OTP codes will be logged");
                Arc::new(ConsoleOtpProvider::new())
            }
        };
        Ok(Self::with_parts(config, pool, adapters, otp))
    }

    /// Assemble state from prebuilt parts.
    #[must_use]
    pub fn with_parts(
        config: ApiConfig,
        pool: PgPool,
        adapters: Adapters,
        otp: Arc<dyn OtpProvider>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                adapters,
                tokens,
                otp,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The configured catalog source.
    #[must_use]
    pub fn products(&self) -> &dyn ProductAdapter {
        self.inner.adapters.products.as_ref()
    }

    /// The configured order sink.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderAdapter {
        self.inner.adapters.orders.as_ref()
    }

    /// Raw WooCommerce client, when credentials are configured.
    #[must_use]
    pub fn woocommerce(&self) -> Option<&WooCommerceClient> {
        self.inner.adapters.woocommerce.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn otp(&self) -> &dyn OtpProvider {
        self.inner.otp.as_ref()
    }
}
