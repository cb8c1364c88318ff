//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry and answered with a generic message and the Sentry
//! event ID as `debug_id`; client errors carry a message the app can show.

use std::borrow::Cow;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::commerce::CommerceError;
use crate::db::RepositoryError;
use crate::response::Envelope;
use crate::services::FieldErrors;
use crate::services::catalog::CatalogError;
use crate::services::coupons::CouponError;
use crate::services::orders::OrderError;
use crate::services::otp::OtpError;
use crate::services::tokens::TokenError;

/// Message shown for every 5xx response.
pub const INTERNAL_ERROR_MSG: &str = "Something went wrong. Please try again later.";

/// Action the client should take to recover.
pub const VERIFY_OTP: &str = "VERIFY_OTP";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// The commerce backend failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Request fields failed validation.
    #[error("Validation error: {0:?}")]
    Validation(FieldErrors),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(Cow<'static, str>),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),

    /// Authenticated but not allowed.
    #[error("Forbidden: {message}")]
    Forbidden {
        message: Cow<'static, str>,
        action_required: Option<&'static str>,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(Cow<'static, str>),

    /// An upstream service could not be reached.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A single-field validation error.
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }

    /// Short for [`AppError::BadRequest`] with a static message.
    #[must_use]
    pub const fn bad_request(message: &'static str) -> Self {
        Self::BadRequest(Cow::Borrowed(message))
    }

    /// Short for [`AppError::NotFound`] with a static message.
    #[must_use]
    pub const fn not_found(message: &'static str) -> Self {
        Self::NotFound(Cow::Borrowed(message))
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Commerce(_) | Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry; the client only sees the event ID
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );

            let message = if matches!(self, Self::BadGateway(_) | Self::Commerce(_)) {
                "External service error"
            } else {
                INTERNAL_ERROR_MSG
            };
            let mut body = Envelope::error(message);
            body.debug_id = Some(event_id.to_string());
            return (status, Json(body)).into_response();
        }

        let body = match self {
            Self::Validation(errors) => Envelope {
                errors: serde_json::to_value(errors).ok(),
                ..Envelope::error("Validation Error")
            },
            Self::Forbidden {
                message,
                action_required,
            } => Envelope {
                action_required,
                ..Envelope::error(message)
            },
            Self::BadRequest(message) | Self::Unauthorized(message) | Self::NotFound(message) => {
                Envelope::error(message)
            }
            Self::Database(RepositoryError::Conflict(message)) => Envelope::error(message),
            Self::Database(_) => Envelope::error("Not found"),
            Self::RateLimited => {
                Envelope::error("Request was throttled. Please try again later.")
            }
            Self::Commerce(_) | Self::BadGateway(_) | Self::Internal(_) => {
                Envelope::error(INTERNAL_ERROR_MSG)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::VerificationRequired => Self::Forbidden {
                message: Cow::Owned(err.to_string()),
                action_required: Some(VERIFY_OTP),
            },
            OrderError::StaffAccessRevoked => Self::Forbidden {
                message: Cow::Owned(err.to_string()),
                action_required: None,
            },
            OrderError::InsufficientBalance
            | OrderError::OrderNotFound
            | OrderError::ProductNotFound
            | OrderError::ItemNotInOrder => Self::BadRequest(Cow::Owned(err.to_string())),
            OrderError::Coupon(e) => e.into(),
            OrderError::InvalidItems(errors) => Self::Validation(errors),
            OrderError::Adapter(e) => match e {
                CommerceError::Repository(e) => Self::Database(e),
                other => Self::BadRequest(Cow::Owned(other.to_string())),
            },
            OrderError::Repository(e) => Self::Database(e),
            OrderError::Database(e) => Self::Database(RepositoryError::Database(e)),
        }
    }
}

impl From<CouponError> for AppError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::Repository(e) => Self::Database(e),
            other => Self::BadRequest(Cow::Owned(other.to_string())),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound => Self::not_found("Product not found"),
            CatalogError::Quantity(e) => Self::field("quantity", e.to_string()),
            CatalogError::Commerce(e) => Self::Commerce(e),
            CatalogError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::InvalidPhone(e) => Self::field("phone_number", e.to_string()),
            OtpError::InvalidCode | OtpError::CheckFailed(_) => {
                Self::BadRequest(Cow::Owned(err.to_string()))
            }
            OtpError::SendFailed(_) | OtpError::Http(_) => Self::BadGateway(err.to_string()),
            OtpError::Repository(e) => Self::Database(e),
            OtpError::Token(e) => e.into(),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(_) => Self::Internal(err.to_string()),
            TokenError::Invalid(_) => Self::Unauthorized(Cow::Borrowed("Invalid or expired token")),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::field("body", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameters");
        Self::not_found("Not found")
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::field("query", rejection.body_text())
    }
}

/// Set the Sentry user context for the authenticated request.
pub fn set_sentry_user(user_id: &impl ToString, phone: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: phone.map(String::from),
            ..Default::default()
        }));
    });
}
