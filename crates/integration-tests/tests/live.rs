//! Live tests against a running API server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database seeded with `sabzi-cli seed all`
//! - The API server running (cargo run -p sabzi-api) on the local backend
//! - `API_DATABASE_URL` set to the server's database for the account tests
//!
//! Account tests sign in with the OTP test numbers, which always accept
//! `123456`.
//!
//! Run with: cargo test -p sabzi-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use sabzi_integration_tests::{api_base_url, live_pool};

const ORDERING_PHONE: &str = "+919998887776";
const WALLET_PHONE: &str = "+919999999999";
const TEST_OTP: &str = "123456";

async fn get_json(path: &str) -> (StatusCode, Value) {
    let resp = Client::new()
        .get(format!("{}{path}", api_base_url()))
        .send()
        .await
        .expect("Failed to reach API server");
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn post_json(path: &str, body: &Value) -> (StatusCode, Value) {
    let resp = Client::new()
        .post(format!("{}{path}", api_base_url()))
        .json(body)
        .send()
        .await
        .expect("Failed to reach API server");
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn send_json(
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Value) {
    let mut request = Client::new().request(method, format!("{}{path}", api_base_url()));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    if let Some(body) = body {
        request = request.json(body);
    }
    let resp = request.send().await.expect("Failed to reach API server");
    let status = resp.status();
    let text = resp.text().await.unwrap();
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

/// Sign in with a test number and return the access token.
///
/// The login endpoint is rate limited, so a 429 is waited out.
async fn login(phone: &str) -> String {
    let body = json!({"phone_number": phone, "otp": TEST_OTP});
    for _ in 0..5 {
        let (status, body) = send_json(Method::POST, "/api/auth/otp/verify", None, Some(&body)).await;
        if status == StatusCode::TOO_MANY_REQUESTS {
            tokio::time::sleep(Duration::from_secs(7)).await;
            continue;
        }
        assert_eq!(status, StatusCode::OK, "{body}");
        return body["data"]["token"].as_str().unwrap().to_string();
    }
    panic!("login for {phone} stayed rate limited");
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

/// Local UUID of a seeded product.
async fn product_id(slug: &str) -> String {
    let (status, body) = get_json(&format!("/api/v2/products/{slug}")).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().unwrap().to_string()
}

fn delivery_fields() -> Value {
    json!({
        "delivery_name": "Live Test",
        "delivery_street": "12 Hazratganj",
        "delivery_city": "Lucknow",
        "delivery_zip_code": "226001",
    })
}

async fn place_order(token: &str, payment_method: &str, items: Value) -> (StatusCode, Value) {
    let mut body = delivery_fields();
    body["payment_method"] = json!(payment_method);
    body["items"] = items;
    send_json(Method::POST, "/api/orders/place", Some(token), Some(&body)).await
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_readiness() {
    let resp = Client::new()
        .get(format!("{}/health/ready", api_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_seeded_categories_are_listed() {
    let (status, body) = get_json("/api/v2/categories").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let slugs: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["slug"].as_str())
        .collect();
    assert!(slugs.contains(&"organic-vegetables"));
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_product_search_and_lookup_by_slug() {
    let (status, body) = get_json("/api/v2/products?search=onion").await;
    assert_eq!(status, StatusCode::OK);
    let products = body["data"].as_array().unwrap();
    assert!(
        products
            .iter()
            .any(|p| p["slug"] == "organic-onion")
    );

    let (status, body) = get_json("/api/v2/products/organic-onion").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Organic Onion");
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_unknown_product_is_not_found() {
    let (status, body) = get_json("/api/v2/products/no-such-vegetable").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_check_delivery() {
    let (status, body) = post_json("/api/check-delivery", &json!({"zip_code": "226001"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], true);
    assert_eq!(body["data"]["city"], "Lucknow");

    let (status, body) = post_json("/api/check-delivery", &json!({"zip_code": "110001"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], false);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_seeded_coupons_are_offered() {
    let (status, body) = get_json("/api/coupons").await;

    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["code"].as_str())
        .collect();
    assert!(codes.contains(&"WELCOME50"));
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_proxy_without_woocommerce_is_not_found() {
    let (status, _) = get_json("/api/proxy/products").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Accounts and orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_order_placement_end_to_end() {
    let token = login(ORDERING_PHONE).await;
    let onion = product_id("organic-onion").await;

    let (status, body) = place_order(
        &token,
        "COD",
        json!([
            {"product_id": onion, "quantity": "1.5"},
            {"product_id": "no-such-vegetable", "quantity": "1"},
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user_msg"], "Order Placed Successfully!");
    let order_id = body["order_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["order_id"], order_id.as_str());

    let (status, body) = send_json(Method::GET, &format!("/api/orders/{order_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let order = &body["data"];
    assert_eq!(order["payment_status"], "PENDING");
    assert_eq!(order["is_cod"], true);
    // the unknown product was skipped
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product"], onion.as_str());
    assert_eq!(decimal(&items[0]["quantity"]), Decimal::new(15, 1));
    assert_eq!(
        decimal(&order["total_price"]),
        decimal(&items[0]["price_at_purchase"]) * Decimal::new(15, 1)
    );

    let (status, body) = send_json(Method::GET, "/api/orders/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|o| o["id"] == order_id.as_str())
    );
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_webhook_completes_payment_and_records_transaction() {
    let token = login(ORDERING_PHONE).await;
    let tomato = product_id("desi-tomato").await;

    let (status, body) = place_order(&token, "RAZORPAY", json!([{"product_id": tomato}])).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order_id = body["order_id"].as_str().unwrap().to_string();
    assert!(body["payment_data"].is_object());

    let transaction_id = format!("pay_live_{}", &order_id[..8]);
    let (status, body) = post_json(
        "/api/payment/webhook",
        &json!({"order_id": order_id, "payment_id": transaction_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["payment_status"], "COMPLETED");

    let (_, body) = send_json(Method::GET, &format!("/api/orders/{order_id}"), Some(&token), None).await;
    assert_eq!(body["data"]["payment_status"], "COMPLETED");

    let pool = live_pool().await;
    let (stored_status, stored_transaction): (String, Option<String>) = sqlx::query_as(
        "SELECT payment_status::TEXT, transaction_id FROM orders WHERE id = $1::UUID",
    )
    .bind(&order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(stored_status, "COMPLETED");
    assert_eq!(stored_transaction.as_deref(), Some(transaction_id.as_str()));
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_wallet_debit_matches_stored_total() {
    let token = login(WALLET_PHONE).await;
    let tomato = product_id("desi-tomato").await;
    let pool = live_pool().await;

    sqlx::query("UPDATE users SET wallet_balance = 100.00 WHERE phone_number = $1")
        .bind(WALLET_PHONE)
        .execute(&pool)
        .await
        .unwrap();

    // 125 g at a whole-rupee kg price lands on a half paisa
    let (status, body) = place_order(
        &token,
        "WALLET",
        json!([{"product_id": tomato, "quantity": "0.125"}]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order_id = body["order_id"].as_str().unwrap().to_string();

    let (_, body) = send_json(Method::GET, &format!("/api/orders/{order_id}"), Some(&token), None).await;
    let total = decimal(&body["data"]["total_price"]);
    assert!(total.scale() <= 2);

    let balance: Decimal =
        sqlx::query_scalar("SELECT wallet_balance FROM users WHERE phone_number = $1")
            .bind(WALLET_PHONE)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(balance, Decimal::new(100, 0) - total);

    // a balance below the total is refused and left untouched
    sqlx::query("UPDATE users SET wallet_balance = 1.00 WHERE phone_number = $1")
        .bind(WALLET_PHONE)
        .execute(&pool)
        .await
        .unwrap();
    let (status, body) = place_order(&token, "WALLET", json!([{"product_id": tomato}])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["user_msg"], "Insufficient Wallet Balance");

    let balance: Decimal =
        sqlx::query_scalar("SELECT wallet_balance FROM users WHERE phone_number = $1")
            .bind(WALLET_PHONE)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(balance, Decimal::ONE);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_default_address_is_exclusive() {
    let token = login(WALLET_PHONE).await;

    let mut ids = Vec::new();
    for name in ["Home", "Office"] {
        let body = json!({
            "name": name,
            "street": "12 Hazratganj",
            "city": "Lucknow",
            "zip_code": "226001",
            "is_default": true,
        });
        let (status, body) = send_json(Method::POST, "/api/addresses", Some(&token), Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["is_default"], true);
        ids.push(body["data"]["id"].as_i64().unwrap());
    }

    let defaults = |body: &Value| -> Vec<i64> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["is_default"] == true)
            .map(|a| a["id"].as_i64().unwrap())
            .collect()
    };

    let (_, body) = send_json(Method::GET, "/api/addresses", Some(&token), None).await;
    assert_eq!(defaults(&body), vec![ids[1]]);

    let (status, _) = send_json(
        Method::PATCH,
        &format!("/api/addresses/{}", ids[0]),
        Some(&token),
        Some(&json!({"is_default": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(Method::GET, "/api/addresses", Some(&token), None).await;
    assert_eq!(defaults(&body), vec![ids[0]]);

    for id in ids {
        let (status, _) =
            send_json(Method::DELETE, &format!("/api/addresses/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_demoted_staff_token_loses_picker_access() {
    let token = login(ORDERING_PHONE).await;
    let pool = live_pool().await;
    let path = "/api/picker/orders/7f9c2b4e-1d3a-4c5b-9e8f-0a1b2c3d4e5f/update";
    let body = json!({"product_id": "organic-onion", "weight": "0.75"});

    let (status, response) = send_json(Method::PATCH, path, Some(&token), Some(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["user_msg"], "Order Not Found");

    sqlx::query(
        "UPDATE users SET is_staff = FALSE, role = 'CUSTOMER' WHERE phone_number = $1",
    )
    .bind(ORDERING_PHONE)
    .execute(&pool)
    .await
    .unwrap();

    let (status, _) = send_json(Method::PATCH, path, Some(&token), Some(&body)).await;

    sqlx::query("UPDATE users SET is_staff = TRUE WHERE phone_number = $1")
        .bind(ORDERING_PHONE)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(status, StatusCode::FORBIDDEN);
}
