//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api                                  - Name, version and status
//!
//! # Catalog (rate limited per IP)
//! GET    /api/v2/products                      - Products from the active backend
//! GET    /api/v2/products/{identifier}         - Product by slug or ID
//! GET    /api/v2/categories                    - Categories from the active backend
//! GET    /api/products                         - Local products (legacy)
//! GET    /api/proxy/products                   - Raw WooCommerce products (legacy)
//!
//! POST   /api/check-delivery                   - Serviceability by zip code
//! POST   /api/cart/add                         - Validate a cart line (auth)
//!
//! # Auth (OTP routes rate limited per IP)
//! POST   /api/auth/otp/send                    - Send a login code
//! POST   /api/auth/otp/verify                  - Verify a code, issue a token
//! PATCH  /api/auth/profile                     - Update name/email (auth)
//!
//! # Orders (auth)
//! POST   /api/orders/place                     - Place an order
//! GET    /api/orders/history                   - Order history
//! GET    /api/orders/{id}                      - Order detail
//! POST   /api/payment/webhook                  - Gateway success callback
//!
//! # Coupons
//! POST   /api/coupons/apply                    - Check a coupon (auth)
//! GET    /api/coupons                          - Active coupons
//!
//! # Account resources (auth)
//! GET|POST              /api/addresses
//! GET|PUT|PATCH|DELETE  /api/addresses/{id}
//! GET|POST              /api/subscriptions
//! GET|PUT|PATCH|DELETE  /api/subscriptions/{id}
//! POST                  /api/subscriptions/{id}/pause|resume|cancel
//! GET|POST              /api/wishlist
//! GET|DELETE            /api/wishlist/{id}
//! POST                  /api/wishlist/toggle
//!
//! # Warehouse (staff)
//! PATCH  /api/picker/orders/{order_id}/update  - Record measured weight
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod delivery;
pub mod orders;
pub mod payment;
pub mod picker;
pub mod products;
pub mod root;
pub mod subscriptions;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{auth_rate_limiter, catalog_rate_limiter, envelope_rate_limited};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/v2/products", get(products::index))
        .route("/v2/products/{identifier}", get(products::show))
        .route("/v2/categories", get(products::categories))
        .route("/products", get(products::legacy_index))
        .route("/proxy/products", get(products::proxy))
        .layer(catalog_rate_limiter())
        .layer(axum::middleware::map_response(envelope_rate_limited))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let otp = Router::new()
        .route("/otp/send", post(auth::send_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .layer(auth_rate_limiter())
        .layer(axum::middleware::map_response(envelope_rate_limited));

    Router::new()
        .merge(otp)
        .route("/profile", patch(auth::update_profile))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/place", post(orders::place))
        .route("/history", get(orders::history))
        .route("/{id}", get(orders::show))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::index))
        .route("/apply", post(coupons::apply))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            get(addresses::show)
                .put(addresses::update)
                .patch(addresses::update)
                .delete(addresses::delete),
        )
}

/// Create the subscription routes router.
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(subscriptions::index).post(subscriptions::create))
        .route(
            "/{id}",
            get(subscriptions::show)
                .put(subscriptions::update)
                .patch(subscriptions::update)
                .delete(subscriptions::delete),
        )
        .route("/{id}/pause", post(subscriptions::pause))
        .route("/{id}/resume", post(subscriptions::resume))
        .route("/{id}/cancel", post(subscriptions::cancel))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index).post(wishlist::create))
        .route("/toggle", post(wishlist::toggle))
        .route("/{id}", get(wishlist::show).delete(wishlist::delete))
}

/// Create all routes for the API, nested under `/api`.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .route("/", get(root::index))
        // Catalog
        .merge(catalog_routes())
        .route("/check-delivery", post(delivery::check))
        .route("/cart/add", post(cart::add))
        // Auth
        .nest("/auth", auth_routes())
        // Orders and payment
        .nest("/orders", order_routes())
        .route("/payment/webhook", post(payment::webhook))
        .nest("/coupons", coupon_routes())
        // Account resources
        .nest("/addresses", address_routes())
        .nest("/subscriptions", subscription_routes())
        .nest("/wishlist", wishlist_routes())
        // Warehouse
        .route("/picker/orders/{order_id}/update", patch(picker::update_weight));

    Router::new().nest("/api", api)
}
