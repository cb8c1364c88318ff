//! Status and role enums.
//!
//! Enums persisted in PostgreSQL map to native enum types (see the API
//! crate's migrations) and serialize in `SCREAMING_SNAKE_CASE`, which is also
//! what clients send.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Order payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Order delivery progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "delivery_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Packing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    /// Whether driver contact and location may be shown to the customer.
    #[must_use]
    pub const fn exposes_driver(self) -> bool {
        matches!(self, Self::OutForDelivery)
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Customer,
    /// Warehouse staff weighing and packing orders.
    Picker,
    Driver,
    /// Store manager.
    Manager,
    Admin,
}

impl UserRole {
    /// Roles allowed on warehouse endpoints regardless of the staff flag.
    #[must_use]
    pub const fn is_warehouse(self) -> bool {
        matches!(self, Self::Picker | Self::Manager | Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Customer => "CUSTOMER",
            Self::Picker => "PICKER",
            Self::Driver => "DRIVER",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "PICKER" => Ok(Self::Picker),
            "DRIVER" => Ok(Self::Driver),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Saved address label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "address_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    #[default]
    Home,
    Work,
    Other,
}

/// How often a subscription delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "subscription_frequency", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionFrequency {
    #[default]
    Daily,
    AlternateDays,
    Weekly,
    Monthly,
}

impl SubscriptionFrequency {
    /// The delivery date following `date`.
    ///
    /// Monthly deliveries clamp to the last day of shorter months. Returns
    /// `None` only when the result would overflow the calendar.
    #[must_use]
    pub fn next_after(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => date.checked_add_days(Days::new(1)),
            Self::AlternateDays => date.checked_add_days(Days::new(2)),
            Self::Weekly => date.checked_add_days(Days::new(7)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
        }
    }

    /// Advance `date` by whole periods until it is on or after `today`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use sabzi_core::SubscriptionFrequency;
    ///
    /// let missed = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    /// let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    /// let next = SubscriptionFrequency::Weekly.roll_forward(missed, today);
    /// assert_eq!(next, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    /// ```
    #[must_use]
    pub fn roll_forward(self, mut date: NaiveDate, today: NaiveDate) -> NaiveDate {
        while date < today {
            match self.next_after(date) {
                Some(next) => date = next,
                None => return today,
            }
        }
        date
    }
}

/// Subscription lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "subscription_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

/// How the customer pays for an order.
///
/// Not persisted directly: it determines `is_cod` and `payment_provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// Debit from the in-app wallet balance.
    Wallet,
    /// Online payment through the gateway.
    #[serde(alias = "CARD")]
    Razorpay,
}

impl PaymentMethod {
    /// Gateway name stored on the order, if any.
    #[must_use]
    pub const fn provider(self) -> Option<&'static str> {
        match self {
            Self::Cod | Self::Wallet => None,
            Self::Razorpay => Some("RAZORPAY"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_after_per_frequency() {
        let start = date(2025, 1, 31);
        assert_eq!(
            SubscriptionFrequency::Daily.next_after(start),
            Some(date(2025, 2, 1))
        );
        assert_eq!(
            SubscriptionFrequency::AlternateDays.next_after(start),
            Some(date(2025, 2, 2))
        );
        assert_eq!(
            SubscriptionFrequency::Weekly.next_after(start),
            Some(date(2025, 2, 7))
        );
        // Clamped to the end of February
        assert_eq!(
            SubscriptionFrequency::Monthly.next_after(start),
            Some(date(2025, 2, 28))
        );
    }

    #[test]
    fn test_roll_forward_keeps_future_dates() {
        let future = date(2025, 6, 1);
        assert_eq!(
            SubscriptionFrequency::Daily.roll_forward(future, date(2025, 5, 1)),
            future
        );
    }

    #[test]
    fn test_roll_forward_alternate_days() {
        let next = SubscriptionFrequency::AlternateDays.roll_forward(date(2025, 5, 1), date(2025, 5, 6));
        assert_eq!(next, date(2025, 5, 7));
    }

    #[test]
    fn test_payment_method_accepts_card_alias() {
        let method: PaymentMethod = serde_json::from_str("\"CARD\"").unwrap();
        assert_eq!(method, PaymentMethod::Razorpay);
        assert_eq!(method.provider(), Some("RAZORPAY"));

        let method: PaymentMethod = serde_json::from_str("\"WALLET\"").unwrap();
        assert_eq!(method.provider(), None);
    }

    #[test]
    fn test_delivery_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&DeliveryStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"OUT_FOR_DELIVERY\"");
        assert!(DeliveryStatus::OutForDelivery.exposes_driver());
        assert!(!DeliveryStatus::Packing.exposes_driver());
    }

    #[test]
    fn test_user_role_round_trips_through_str() {
        assert_eq!("picker".parse::<UserRole>(), Ok(UserRole::Picker));
        assert_eq!(UserRole::Manager.to_string(), "MANAGER");
        assert!("chef".parse::<UserRole>().is_err());
    }
}
