//! Coupon route handlers.

use axum::{extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::Coupon;
use crate::response::{ApiJson, ApiResponse};
use crate::services::coupons::CouponService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: Option<String>,
    pub order_total: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct AppliedCoupon {
    pub coupon: String,
    pub discount_amount: Decimal,
    pub message: &'static str,
}

/// Check a coupon against the cart total before checkout.
///
/// POST /api/coupons/apply
///
/// The same rules are applied again when the order is placed.
///
/// # Errors
///
/// Returns 400 with the failed rule's message.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn apply(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiJson(req): ApiJson<ApplyCouponRequest>,
) -> Result<impl IntoResponse, AppError> {
    let code = req.code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let (Some(code), Some(order_total)) = (code, req.order_total) else {
        return Err(AppError::bad_request("Code and Order Total required"));
    };

    let coupon = CouponService::new(state.pool())
        .validate(code, order_total, claims.sub)
        .await?;

    Ok(ApiResponse::ok(AppliedCoupon {
        coupon: coupon.code,
        discount_amount: coupon.discount_amount,
        message: "Coupon Applied Successfully",
    })
    .with_message("Coupon Applied Successfully"))
}

/// A coupon as listed to customers.
#[derive(Debug, Serialize)]
pub struct CouponOffer {
    pub code: String,
    pub discount_amount: Decimal,
    pub min_order_value: Decimal,
    pub desc: String,
}

impl From<Coupon> for CouponOffer {
    fn from(coupon: Coupon) -> Self {
        let desc = coupon.description();
        Self {
            code: coupon.code,
            discount_amount: coupon.discount_amount,
            min_order_value: coupon.min_order_value,
            desc,
        }
    }
}

/// Coupons currently on offer.
///
/// GET /api/coupons
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let offers: Vec<CouponOffer> = CouponService::new(state.pool())
        .list_available()
        .await?
        .into_iter()
        .map(CouponOffer::from)
        .collect();
    Ok(ApiResponse::ok(offers))
}
