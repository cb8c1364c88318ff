//! Core domain types.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod price;
pub mod quantity;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{PhoneNumber, PhoneNumberError};
pub use price::{CurrencyCode, Price, round_currency};
pub use quantity::{MAX_QUANTITY, QUANTITY_SCALE, QuantityError, is_piece_unit, validate_quantity};
pub use status::*;
