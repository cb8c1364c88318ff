//! Payment gateway callback.
//!
//! The gateway is mocked, so the webhook is unauthenticated and trusts the
//! body it receives.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sabzi_core::{OrderId, PaymentStatus};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::AppError;
use crate::response::{ApiJson, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub payment_id: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub order_id: OrderId,
    pub transaction_id: String,
    pub payment_status: PaymentStatus,
}

/// Mark an order paid.
///
/// POST /api/payment/webhook
///
/// # Errors
///
/// Returns 404 "Order Not Found" for unknown or malformed order IDs and 400
/// when the payment ID is missing.
#[instrument(skip(state))]
pub async fn webhook(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WebhookRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order_id: OrderId = req
        .order_id
        .trim()
        .parse()
        .map_err(|_| AppError::not_found("Order Not Found"))?;

    let transaction_id = req.payment_id.trim();
    if transaction_id.is_empty() {
        return Err(AppError::field("payment_id", "This field is required."));
    }

    match OrderRepository::new(state.pool())
        .mark_paid(order_id, transaction_id)
        .await
    {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => return Err(AppError::not_found("Order Not Found")),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(order_id = %order_id, transaction_id, "Payment verified");

    Ok(ApiResponse::ok(WebhookResponse {
        order_id,
        transaction_id: transaction_id.to_string(),
        payment_status: PaymentStatus::Completed,
    })
    .with_message("Payment Verified"))
}
