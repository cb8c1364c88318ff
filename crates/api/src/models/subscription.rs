//! Recurring deliveries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use sabzi_core::{
    ProductId, SubscriptionFrequency, SubscriptionId, SubscriptionStatus, UserId,
};

use crate::commerce::CatalogProduct;

/// A row of the `subscriptions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub frequency: SubscriptionFrequency,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    pub next_delivery_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A subscription with its product, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub id: SubscriptionId,
    pub user: UserId,
    pub product: ProductId,
    pub product_details: Option<CatalogProduct>,
    pub quantity: i32,
    pub frequency: SubscriptionFrequency,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    pub next_delivery_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionView {
    #[must_use]
    pub fn new(sub: Subscription, product_details: Option<CatalogProduct>) -> Self {
        Self {
            id: sub.id,
            user: sub.user_id,
            product: sub.product_id,
            product_details,
            quantity: sub.quantity,
            frequency: sub.frequency,
            status: sub.status,
            start_date: sub.start_date,
            next_delivery_date: sub.next_delivery_date,
            created_at: sub.created_at,
        }
    }
}
