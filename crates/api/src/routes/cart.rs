//! Cart validation.
//!
//! Carts live on the device; the server only checks a line before the app
//! adds it.

use axum::{extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::response::{ApiJson, ApiResponse};
use crate::services::catalog::{ProductRef, ProductService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CartAddRequest {
    pub product_id: Option<ProductRef>,
    #[serde(default = "one")]
    pub quantity: Decimal,
}

const fn one() -> Decimal {
    Decimal::ONE
}

/// POST /api/cart/add
///
/// # Errors
///
/// Returns 400 for a missing product or invalid quantity and 404 for an
/// unknown or inactive product.
#[instrument(skip(state, _auth))]
pub async fn add(
    State(state): State<AppState>,
    _auth: RequireAuth,
    ApiJson(req): ApiJson<CartAddRequest>,
) -> Result<impl IntoResponse, AppError> {
    let product = req
        .product_id
        .filter(|p| !p.is_blank())
        .ok_or_else(|| AppError::field("product_id", "This field is required."))?;

    let item = ProductService::new(state.pool(), state.products())
        .validate_cart_item(&product, req.quantity)
        .await?;
    Ok(ApiResponse::ok(item))
}
