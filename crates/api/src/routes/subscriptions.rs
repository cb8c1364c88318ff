//! Recurring delivery route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sabzi_core::{SubscriptionFrequency, SubscriptionId, SubscriptionStatus, UserId};

use crate::db::{NewSubscription, SubscriptionRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{Subscription, SubscriptionView};
use crate::response::{ApiJson, ApiPath, ApiResponse};
use crate::services::catalog::{ProductRef, ProductService};
use crate::state::AppState;

const SUBSCRIPTION_NOT_FOUND: &str = "Subscription not found";

async fn with_products(
    state: &AppState,
    subscriptions: Vec<Subscription>,
) -> Result<Vec<SubscriptionView>, AppError> {
    let ids: Vec<_> = subscriptions.iter().map(|s| s.product_id).collect();
    let mut products = ProductService::new(state.pool(), state.products())
        .details_by_id(&ids)
        .await?;

    Ok(subscriptions
        .into_iter()
        .map(|sub| {
            let details = products.remove(&sub.product_id);
            SubscriptionView::new(sub, details)
        })
        .collect())
}

async fn view(state: &AppState, subscription: Subscription) -> Result<SubscriptionView, AppError> {
    let mut views = with_products(state, vec![subscription]).await?;
    views
        .pop()
        .ok_or_else(|| AppError::Internal("subscription view missing".to_string()))
}

fn check_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(AppError::field(
            "quantity",
            "Ensure this value is greater than or equal to 1.",
        ));
    }
    Ok(())
}

/// GET /api/subscriptions
///
/// # Errors
///
/// Returns `AppError` if the query fails.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let subscriptions = SubscriptionRepository::new(state.pool())
        .list_for_user(claims.sub)
        .await?;
    Ok(ApiResponse::ok(with_products(&state, subscriptions).await?))
}

/// GET /api/subscriptions/{id}
///
/// # Errors
///
/// Returns 404 if the user has no such subscription.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<SubscriptionId>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = SubscriptionRepository::new(state.pool())
        .get(id, claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found(SUBSCRIPTION_NOT_FOUND))?;
    Ok(ApiResponse::ok(view(&state, subscription).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    #[serde(alias = "product_id")]
    pub product: Option<ProductRef>,
    #[serde(default = "one")]
    pub quantity: i32,
    #[serde(default)]
    pub frequency: SubscriptionFrequency,
    /// Defaults to today.
    pub start_date: Option<NaiveDate>,
}

const fn one() -> i32 {
    1
}

/// Start a subscription. The first delivery is on the start date.
///
/// POST /api/subscriptions
///
/// # Errors
///
/// Returns 400 for a missing product or bad quantity and 404 for an unknown
/// product.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiJson(req): ApiJson<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let product = req
        .product
        .filter(|p| !p.is_blank())
        .ok_or_else(|| AppError::field("product", "This field is required."))?;
    check_quantity(req.quantity)?;

    let listing = ProductService::new(state.pool(), state.products())
        .resolve_active(&product)
        .await?;

    let start_date = req.start_date.unwrap_or_else(|| Utc::now().date_naive());
    let subscription = SubscriptionRepository::new(state.pool())
        .create(&NewSubscription {
            user_id: claims.sub,
            product_id: listing.product.id,
            quantity: req.quantity,
            frequency: req.frequency,
            start_date,
            next_delivery_date: start_date,
        })
        .await?;

    tracing::info!(subscription_id = %subscription.id, "Subscription created");
    Ok(ApiResponse::created(view(&state, subscription).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub quantity: Option<i32>,
    pub frequency: Option<SubscriptionFrequency>,
}

/// Change quantity or frequency.
///
/// PUT|PATCH /api/subscriptions/{id}
///
/// # Errors
///
/// Returns 404 if the user has no such subscription.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<SubscriptionId>,
    ApiJson(req): ApiJson<UpdateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(quantity) = req.quantity {
        check_quantity(quantity)?;
    }

    let subscription = SubscriptionRepository::new(state.pool())
        .update(id, claims.sub, req.quantity, req.frequency)
        .await?;
    Ok(ApiResponse::ok(view(&state, subscription).await?))
}

/// DELETE /api/subscriptions/{id}
///
/// # Errors
///
/// Returns 404 if the user has no such subscription.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<SubscriptionId>,
) -> Result<impl IntoResponse, AppError> {
    if !SubscriptionRepository::new(state.pool())
        .delete(id, claims.sub)
        .await?
    {
        return Err(AppError::not_found(SUBSCRIPTION_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Status actions
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusChange {
    pub status: &'static str,
}

async fn set_status(
    state: &AppState,
    user_id: UserId,
    id: SubscriptionId,
    status: SubscriptionStatus,
) -> Result<Subscription, AppError> {
    let repo = SubscriptionRepository::new(state.pool());
    let current = repo
        .get(id, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(SUBSCRIPTION_NOT_FOUND))?;

    // A resumed subscription never delivers in the past
    let next_delivery_date = (status == SubscriptionStatus::Active).then(|| {
        current
            .frequency
            .roll_forward(current.next_delivery_date, Utc::now().date_naive())
    });

    let updated = repo
        .set_status(id, user_id, status, next_delivery_date)
        .await?;
    tracing::info!(
        subscription_id = %id,
        status = ?updated.status,
        next_delivery_date = %updated.next_delivery_date,
        "Subscription status changed"
    );
    Ok(updated)
}

/// POST /api/subscriptions/{id}/pause
///
/// # Errors
///
/// Returns 404 if the user has no such subscription.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn pause(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<SubscriptionId>,
) -> Result<impl IntoResponse, AppError> {
    set_status(&state, claims.sub, id, SubscriptionStatus::Paused).await?;
    Ok(ApiResponse::ok(StatusChange {
        status: "Subscription paused",
    }))
}

/// POST /api/subscriptions/{id}/resume
///
/// A next delivery date already in the past is moved forward by the
/// subscription's frequency.
///
/// # Errors
///
/// Returns 404 if the user has no such subscription.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn resume(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<SubscriptionId>,
) -> Result<impl IntoResponse, AppError> {
    set_status(&state, claims.sub, id, SubscriptionStatus::Active).await?;
    Ok(ApiResponse::ok(StatusChange {
        status: "Subscription resumed",
    }))
}

/// POST /api/subscriptions/{id}/cancel
///
/// # Errors
///
/// Returns 404 if the user has no such subscription.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<SubscriptionId>,
) -> Result<impl IntoResponse, AppError> {
    set_status(&state, claims.sub, id, SubscriptionStatus::Cancelled).await?;
    Ok(ApiResponse::ok(StatusChange {
        status: "Subscription cancelled",
    }))
}
