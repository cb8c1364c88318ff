//! Wishlist route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sabzi_core::{ProductId, WishlistEntryId};

use crate::db::{CatalogRepository, WishlistRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{WishlistEntry, WishlistView};
use crate::response::{ApiJson, ApiPath, ApiResponse};
use crate::services::catalog::{ProductRef, ProductService};
use crate::state::AppState;

const ENTRY_NOT_FOUND: &str = "Wishlist item not found";

async fn with_products(
    state: &AppState,
    entries: Vec<WishlistEntry>,
) -> Result<Vec<WishlistView>, AppError> {
    let ids: Vec<ProductId> = entries.iter().map(|e| e.product_id).collect();
    let mut products = ProductService::new(state.pool(), state.products())
        .details_by_id(&ids)
        .await?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            let details = products.remove(&entry.product_id);
            WishlistView::new(entry, details)
        })
        .collect())
}

/// GET /api/wishlist
///
/// # Errors
///
/// Returns `AppError` if the query fails.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let entries = WishlistRepository::new(state.pool())
        .list_for_user(claims.sub)
        .await?;
    Ok(ApiResponse::ok(with_products(&state, entries).await?))
}

/// GET /api/wishlist/{id}
///
/// # Errors
///
/// Returns 404 if the user has no such entry.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<WishlistEntryId>,
) -> Result<impl IntoResponse, AppError> {
    let entry = WishlistRepository::new(state.pool())
        .get(id, claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found(ENTRY_NOT_FOUND))?;

    let mut views = with_products(&state, vec![entry]).await?;
    let view = views
        .pop()
        .ok_or_else(|| AppError::Internal("wishlist view missing".to_string()))?;
    Ok(ApiResponse::ok(view))
}

#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    #[serde(alias = "product_id")]
    pub product: Option<ProductRef>,
}

/// Save a product. Saving one already on the list returns the existing entry.
///
/// POST /api/wishlist
///
/// # Errors
///
/// Returns 400 without a product and 404 for an unknown product.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiJson(req): ApiJson<AddToWishlistRequest>,
) -> Result<impl IntoResponse, AppError> {
    let product = req
        .product
        .filter(|p| !p.is_blank())
        .ok_or_else(|| AppError::field("product", "This field is required."))?;

    let listing = ProductService::new(state.pool(), state.products())
        .resolve_active(&product)
        .await?;
    let entry = WishlistRepository::new(state.pool())
        .add(claims.sub, listing.product.id)
        .await?;

    let mut views = with_products(&state, vec![entry]).await?;
    let view = views
        .pop()
        .ok_or_else(|| AppError::Internal("wishlist view missing".to_string()))?;
    Ok(ApiResponse::created(view))
}

/// DELETE /api/wishlist/{id}
///
/// # Errors
///
/// Returns 404 if the user has no such entry.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<WishlistEntryId>,
) -> Result<impl IntoResponse, AppError> {
    if !WishlistRepository::new(state.pool())
        .delete(id, claims.sub)
        .await?
    {
        return Err(AppError::not_found(ENTRY_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub product_id: Option<ProductRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleStatus {
    Added,
    Removed,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub status: ToggleStatus,
    pub product_id: ProductRef,
}

/// Add the product if it is not saved, remove it if it is.
///
/// POST /api/wishlist/toggle
///
/// # Errors
///
/// Returns 400 without a product ID and 404 for an unknown product.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiJson(req): ApiJson<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = req
        .product_id
        .filter(|p| !p.is_blank())
        .ok_or_else(|| AppError::bad_request("Product ID required"))?;

    // Inactive products can still be taken off the list
    let listing = CatalogRepository::new(state.pool())
        .resolve(product_id.as_str())
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let wishlist = WishlistRepository::new(state.pool());
    let status = if wishlist.remove_product(claims.sub, listing.product.id).await? {
        ToggleStatus::Removed
    } else {
        wishlist.add(claims.sub, listing.product.id).await?;
        ToggleStatus::Added
    };

    Ok(ApiResponse::ok(ToggleResponse { status, product_id }))
}
