//! In-process router tests.
//!
//! Requests run through the same middleware stack the server uses. The pool
//! never connects, so every case here is rejected or answered before any
//! query runs.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;

use sabzi_core::UserRole;
use sabzi_integration_tests::{bearer, get, json_request, send, test_app, test_state, test_user};

// ============================================================================
// Root and health
// ============================================================================

#[tokio::test]
async fn test_root_reports_service_info() {
    let res = send(test_app(), get("/api", None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Organic Sabzi Wala API");
    assert_eq!(res.json["version"], "2.0");
    assert_eq!(res.json["status"], "running");
}

#[tokio::test]
async fn test_liveness_does_not_need_database() {
    let res = send(test_app(), get("/health", None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text, "ok");
}

#[tokio::test]
async fn test_trailing_slash_is_trimmed() {
    let app = NormalizePathLayer::trim_trailing_slash().layer(test_app());
    let res = send(app, get("/api/", None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["status"], "running");
}

#[tokio::test]
async fn test_unknown_route_gets_error_envelope() {
    let res = send(test_app(), get("/api/does-not-exist", None)).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json["success"], false);
    assert!(res.json["data"].is_null());
    assert_eq!(res.json["user_msg"], "Not found");
}

#[tokio::test]
async fn test_security_and_request_id_headers() {
    let res = send(test_app(), get("/api", None)).await;

    assert_eq!(res.headers["x-content-type-options"], "nosniff");
    assert_eq!(res.headers["x-frame-options"], "DENY");
    assert!(res.headers.contains_key("x-request-id"));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    for uri in [
        "/api/orders/history",
        "/api/addresses",
        "/api/subscriptions",
        "/api/wishlist",
    ] {
        let res = send(test_app(), get(uri, None)).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(res.json["success"], false, "{uri}");
    }
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let res = send(
        test_app(),
        get("/api/orders/history", Some("Bearer not.a.token")),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_another_secret_is_rejected() {
    let mut config = sabzi_integration_tests::test_config();
    config.jwt.secret = "a-completely-different-signing-key-0001".to_string().into();
    let other = sabzi_api::services::tokens::TokenService::new(&config.jwt);
    let token = other.issue(&test_user(1, UserRole::Admin)).unwrap();

    let res = send(
        test_app(),
        get("/api/wishlist", Some(&format!("Bearer {token}"))),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Picker
// ============================================================================

const PICKER_URI: &str = "/api/picker/orders/7f9c2b4e-1d3a-4c5b-9e8f-0a1b2c3d4e5f/update";

#[tokio::test]
async fn test_picker_route_forbids_customers() {
    let state = test_state();
    let auth = bearer(&state, &test_user(7, UserRole::Customer));

    let res = send(
        sabzi_api::app(state),
        json_request(
            "PATCH",
            PICKER_URI,
            Some(&auth),
            &json!({"product_id": 3, "weight": "0.75"}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(
        res.json["user_msg"],
        "You do not have permission to perform this action."
    );
}

#[tokio::test]
async fn test_picker_requires_product_and_positive_weight() {
    let state = test_state();
    let auth = bearer(&state, &test_user(8, UserRole::Picker));

    for body in [
        json!({"product_id": 3}),
        json!({"weight": "1.2"}),
        json!({"product_id": 3, "weight": "0"}),
        json!({"product_id": 3, "weight": "-0.5"}),
    ] {
        let res = send(
            sabzi_api::app(state.clone()),
            json_request("PATCH", PICKER_URI, Some(&auth), &body),
        )
        .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(res.json["user_msg"], "Product ID and Weight required");
    }
}

#[tokio::test]
async fn test_picker_rejects_unstorable_weight() {
    let state = test_state();
    let auth = bearer(&state, &test_user(8, UserRole::Picker));

    for weight in ["10000000", "0.0004", "79228162514264337593543950335"] {
        let body = json!({"product_id": 3, "weight": weight});
        let res = send(
            sabzi_api::app(state.clone()),
            json_request("PATCH", PICKER_URI, Some(&auth), &body),
        )
        .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(res.json["user_msg"], "Validation Error");
        assert!(res.json["errors"]["weight"][0].is_string());
    }
}

// ============================================================================
// Request validation
// ============================================================================

#[tokio::test]
async fn test_cart_add_requires_product_id() {
    let state = test_state();
    let auth = bearer(&state, &test_user(9, UserRole::Customer));

    let res = send(
        sabzi_api::app(state),
        json_request("POST", "/api/cart/add", Some(&auth), &json!({"quantity": 2})),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["user_msg"], "Validation Error");
    assert_eq!(res.json["errors"]["product_id"][0], "This field is required.");
}

#[tokio::test]
async fn test_send_otp_requires_phone() {
    let res = send(
        test_app(),
        json_request("POST", "/api/auth/otp/send", None, &json!({"phone_number": "  "})),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["user_msg"], "Phone number required");
}

#[tokio::test]
async fn test_verify_otp_requires_phone_and_code() {
    let res = send(
        test_app(),
        json_request(
            "POST",
            "/api/auth/otp/verify",
            None,
            &json!({"phone_number": "9876543210"}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["user_msg"], "Phone and OTP required");
}

#[tokio::test]
async fn test_coupon_apply_requires_code_and_total() {
    let state = test_state();
    let auth = bearer(&state, &test_user(10, UserRole::Customer));

    let res = send(
        sabzi_api::app(state),
        json_request(
            "POST",
            "/api/coupons/apply",
            Some(&auth),
            &json!({"code": "WELCOME50"}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["user_msg"], "Code and Order Total required");
}

#[tokio::test]
async fn test_address_create_lists_blank_fields() {
    let state = test_state();
    let auth = bearer(&state, &test_user(11, UserRole::Customer));

    let res = send(
        sabzi_api::app(state),
        json_request(
            "POST",
            "/api/addresses",
            Some(&auth),
            &json!({"name": "Home", "street": "", "city": "Lucknow"}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let errors = res.json["errors"].as_object().unwrap();
    assert!(errors.contains_key("street"));
    assert!(errors.contains_key("zip_code"));
    assert!(!errors.contains_key("name"));
}

#[tokio::test]
async fn test_payment_webhook_with_unparseable_order_is_not_found() {
    let res = send(
        test_app(),
        json_request(
            "POST",
            "/api/payment/webhook",
            None,
            &json!({"order_id": "ORD-abc", "payment_id": "pay_123"}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json["user_msg"], "Order Not Found");
}

#[tokio::test]
async fn test_malformed_json_gets_error_envelope() {
    let state = test_state();
    let auth = bearer(&state, &test_user(12, UserRole::Customer));
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/orders/place")
        .header("content-type", "application/json")
        .header("authorization", auth)
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let res = send(sabzi_api::app(state), request).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["success"], false);
}
