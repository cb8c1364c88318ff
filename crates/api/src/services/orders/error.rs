//! Order error types.

use thiserror::Error;

use crate::commerce::CommerceError;
use crate::db::RepositoryError;
use crate::services::FieldErrors;
use crate::services::coupons::CouponError;

/// Errors that can occur while placing or picking an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Cash on delivery needs a verified phone number.
    #[error("Verification Required for COD. Please verify your phone number via OTP.")]
    VerificationRequired,

    /// Wallet balance is below the order total.
    #[error("Insufficient Wallet Balance")]
    InsufficientBalance,

    /// The coupon failed an eligibility rule.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// One or more order lines are invalid, keyed by field.
    #[error("invalid order items")]
    InvalidItems(FieldErrors),

    /// The account lost warehouse access after its token was issued.
    #[error("You do not have permission to perform this action.")]
    StaffAccessRevoked,

    #[error("Order Not Found")]
    OrderNotFound,

    #[error("Product Not Found")]
    ProductNotFound,

    /// The order has no line for the product.
    #[error("Item not found in order")]
    ItemNotInOrder,

    /// The commerce backend rejected the update.
    #[error(transparent)]
    Adapter(#[from] CommerceError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Transaction begin or commit failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
