//! Wishlist entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sabzi_core::{ProductId, UserId, WishlistEntryId};

use crate::commerce::CatalogProduct;

/// A saved product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: WishlistEntryId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

/// A wishlist entry with its product, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistView {
    pub id: WishlistEntryId,
    pub user: UserId,
    pub product: ProductId,
    pub product_details: Option<CatalogProduct>,
    pub created_at: DateTime<Utc>,
}

impl WishlistView {
    #[must_use]
    pub fn new(entry: WishlistEntry, product_details: Option<CatalogProduct>) -> Self {
        Self {
            id: entry.id,
            user: entry.user_id,
            product: entry.product_id,
            product_details,
            created_at: entry.created_at,
        }
    }
}
