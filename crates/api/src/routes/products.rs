//! Catalog route handlers.
//!
//! The `/v2` endpoints go through the configured product adapter, so they
//! serve the local catalog or WooCommerce depending on `PRODUCT_BACKEND`.
//! The unversioned endpoints are kept for older app builds.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::commerce::ProductQuery;
use crate::error::AppError;
use crate::response::{ApiPath, ApiQuery, ApiResponse};
use crate::services::catalog::ProductService;
use crate::state::AppState;

/// Product list.
///
/// GET /api/v2/products?category=&search=&page=&per_page=
///
/// # Errors
///
/// Returns `AppError` if the catalog cannot be read.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = ProductService::new(state.pool(), state.products())
        .list(query)
        .await?;
    Ok(ApiResponse::ok(products))
}

/// Product detail by slug or ID.
///
/// GET /api/v2/products/{identifier}
///
/// # Errors
///
/// Returns 404 if no product matches.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(identifier): ApiPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = ProductService::new(state.pool(), state.products())
        .get(&identifier)
        .await?;
    Ok(ApiResponse::ok(product))
}

/// Category list.
///
/// GET /api/v2/categories
///
/// # Errors
///
/// Returns `AppError` if the catalog cannot be read.
pub async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = ProductService::new(state.pool(), state.products())
        .categories()
        .await?;
    Ok(ApiResponse::ok(categories))
}

/// Active products straight from the local database.
///
/// GET /api/products
///
/// # Errors
///
/// Returns `AppError` if the query fails.
pub async fn legacy_index(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let products = ProductService::new(state.pool(), state.products())
        .local_listings()
        .await?;
    Ok(ApiResponse::ok(products))
}

/// WooCommerce product JSON, passed through unwrapped with WooCommerce's
/// status code.
///
/// GET /api/proxy/products
///
/// # Errors
///
/// Returns 404 when no WooCommerce store is configured and 502 when it cannot
/// be reached.
pub async fn proxy(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let client = state
        .woocommerce()
        .ok_or_else(|| AppError::not_found("WooCommerce is not configured"))?;

    let (status, body) = client.products_raw(&params).await.map_err(|e| {
        tracing::warn!(error = %e, "WooCommerce proxy request failed");
        AppError::BadGateway(format!("WooCommerce connection failed: {e}"))
    })?;

    Ok((status, Json(body)))
}
