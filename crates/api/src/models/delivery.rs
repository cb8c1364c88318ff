//! Delivery zones.

use serde::Serialize;

use sabzi_core::DeliveryZoneId;

/// A zip code the store delivers to (or has paused).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeliveryZone {
    pub id: DeliveryZoneId,
    pub zip_code: String,
    pub city: String,
    /// Promised delivery window.
    pub delivery_time_hrs: i32,
    pub is_serviceable: bool,
}
