//! Delivery serviceability.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::db::DeliveryZoneRepository;
use crate::error::AppError;
use crate::response::{ApiJson, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckDeliveryRequest {
    #[serde(default)]
    pub zip_code: String,
}

/// Serviceability of a zip code.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DeliveryAvailability {
    Available {
        available: bool,
        city: String,
        delivery_time_hrs: i32,
    },
    Unavailable {
        available: bool,
        message: &'static str,
    },
}

/// POST /api/check-delivery
///
/// An unknown or paused zip code is a successful `available: false` answer,
/// not an error.
///
/// # Errors
///
/// Returns `AppError` if the lookup fails.
pub async fn check(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CheckDeliveryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let zone = DeliveryZoneRepository::new(state.pool())
        .find_serviceable(&req.zip_code)
        .await?;

    let availability = zone.map_or(
        DeliveryAvailability::Unavailable {
            available: false,
            message: "Delivery not available in your area yet.",
        },
        |zone| DeliveryAvailability::Available {
            available: true,
            city: zone.city,
            delivery_time_hrs: zone.delivery_time_hrs,
        },
    );
    Ok(ApiResponse::ok(availability))
}
