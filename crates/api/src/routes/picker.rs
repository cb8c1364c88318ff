//! Warehouse picker endpoints.

use axum::{extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sabzi_core::{MAX_QUANTITY, OrderId, QUANTITY_SCALE};

use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::response::{ApiJson, ApiPath, ApiResponse};
use crate::services::catalog::ProductRef;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Measured weight of one order line.
#[derive(Debug, Deserialize)]
pub struct WeightUpdateRequest {
    pub product_id: Option<ProductRef>,
    /// Kilograms.
    pub weight: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct WeightUpdated {
    pub success: bool,
    pub message: &'static str,
}

/// Record the weight a picker measured for a line item.
///
/// PATCH /api/picker/orders/{order_id}/update
///
/// The weight is stored locally and then pushed to the active order backend;
/// a backend failure fails the request. The token's staff flag is checked
/// against the caller's account before anything is written.
///
/// # Errors
///
/// Returns 401/403 for non-staff callers and 400 for missing or out of range
/// input, unknown orders or products, or a backend rejection.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn update_weight(
    State(state): State<AppState>,
    RequireStaff(claims): RequireStaff,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<WeightUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = req.product_id.filter(|p| !p.is_blank());
    let weight = req.weight.filter(|w| w.is_sign_positive() && !w.is_zero());
    let (Some(product_id), Some(weight)) = (product_id, weight) else {
        return Err(AppError::bad_request("Product ID and Weight required"));
    };
    if weight > MAX_QUANTITY || weight.normalize().scale() > QUANTITY_SCALE {
        return Err(AppError::field(
            "weight",
            "Weight must be under 10000000 kg with at most 3 decimal places",
        ));
    }

    OrderService::new(state.pool(), state.orders())
        .update_item_weight(claims.sub, order_id, &product_id, weight)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Picker weight update failed"))?;

    Ok(ApiResponse::ok(WeightUpdated {
        success: true,
        message: "Weight updated successfully",
    })
    .with_message("Weight updated successfully"))
}
