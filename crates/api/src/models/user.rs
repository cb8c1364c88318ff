//! User domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sabzi_core::{Email, PhoneNumber, UserId, UserRole};

/// A phone-authenticated account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized E.164 phone number (login identity).
    pub phone_number: PhoneNumber,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
    /// Set once an OTP for this number has been verified.
    pub is_phone_verified: bool,
    /// Prepaid balance usable for `WALLET` orders.
    pub wallet_balance: Decimal,
    pub role: UserRole,
    /// Grants access to warehouse endpoints.
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account may use picker/warehouse endpoints.
    #[must_use]
    pub const fn is_warehouse_staff(&self) -> bool {
        self.is_staff || self.role.is_warehouse()
    }
}

/// The profile returned after login and from profile updates.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub phone_number: PhoneNumber,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
    pub is_phone_verified: bool,
    pub wallet_balance: Decimal,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            is_phone_verified: user.is_phone_verified,
            wallet_balance: user.wallet_balance,
        }
    }
}
