//! API root.

use axum::Json;
use serde::Serialize;

/// Service identification for `GET /api`.
#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// GET /api
pub async fn index() -> Json<ApiInfo> {
    Json(ApiInfo {
        message: "Organic Sabzi Wala API",
        version: "2.0",
        status: "running",
    })
}
