//! Order route handlers.

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use sabzi_core::OrderId;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::OrderView;
use crate::response::{ApiJson, ApiPath, ApiResponse};
use crate::services::orders::{OrderService, PlaceOrderRequest};
use crate::services::payment::PaymentInitiation;
use crate::state::AppState;

/// Result of a successful placement.
#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_data: Option<PaymentInitiation>,
}

/// Place an order.
///
/// POST /api/orders/place
///
/// `order_id` (and `payment_data` for gateway payments) are also repeated at
/// the top level of the body, where older app builds read them.
///
/// # Errors
///
/// Returns 403 with `action_required: "VERIFY_OTP"` for unverified COD, and
/// 400 for insufficient balance, a rejected coupon or invalid items.
#[instrument(skip(state, claims, req), fields(user_id = %claims.sub))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiJson(req): ApiJson<PlaceOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let placed = OrderService::new(state.pool(), state.orders())
        .place_order(claims.sub, req)
        .await?;

    let body = PlaceOrderResponse {
        order_id: placed.order.id,
        payment_data: placed.payment,
    };
    let mut response = ApiResponse::ok(&body)
        .with_message("Order Placed Successfully!")
        .with_top_level("order_id", body.order_id);
    if let Some(payment) = &body.payment_data {
        response = response.with_top_level("payment_data", payment);
    }

    Ok(response.into_response())
}

/// The signed-in user's orders, newest first.
///
/// GET /api/orders/history
///
/// # Errors
///
/// Returns `AppError` if the query fails.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let repo = OrderRepository::new(state.pool());
    let orders = repo.list_for_user(claims.sub).await?;

    let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
    let mut items = repo.items_by_order(&ids).await?;

    let views: Vec<OrderView> = orders
        .into_iter()
        .map(|order| {
            let lines = items.remove(&order.id).unwrap_or_default();
            OrderView::new(order, lines)
        })
        .collect();
    Ok(ApiResponse::ok(views))
}

/// One of the signed-in user's orders.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns 404 if the order does not exist or belongs to someone else.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<impl IntoResponse, AppError> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_for_user(id, claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("Order Not Found"))?;
    let items = repo.items(order.id).await?;

    Ok(ApiResponse::ok(OrderView::new(order, items)))
}
