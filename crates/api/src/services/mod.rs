//! Business logic services.
//!
//! Route handlers stay thin: they parse the request, build the service they
//! need from `AppState`, and map the service error to an `AppError`.
//!
//! # Services
//!
//! - `catalog` - Product listing through the configured adapter, cart validation
//! - `coupons` - Coupon eligibility rules
//! - `orders` - Order placement, external sync and picker weight updates
//! - `otp` - Phone login by one-time code (Twilio Verify or console)
//! - `payment` - Mock gateway payment initiation
//! - `tokens` - JWT access tokens

use std::collections::BTreeMap;

pub mod catalog;
pub mod coupons;
pub mod orders;
pub mod otp;
pub mod payment;
pub mod tokens;

/// Validation messages keyed by request field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;
