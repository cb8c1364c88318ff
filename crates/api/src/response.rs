//! Response envelope and request extractors.
//!
//! Every endpoint answers with
//! `{"success": bool, "data": ..., "user_msg": "..."}`. Errors add `errors`,
//! `action_required` or `debug_id` where they apply (see [`crate::error`]).

use std::borrow::Cow;

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Default message on successful responses.
pub const SUCCESS_MSG: &str = "Success";

/// The JSON body shared by all responses.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub user_msg: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_required: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_id: Option<String>,
    /// Extra top-level keys older clients read directly.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope<()> {
    /// An error body with no data.
    #[must_use]
    pub fn error(user_msg: impl Into<Cow<'static, str>>) -> Self {
        Self {
            success: false,
            data: None,
            user_msg: user_msg.into(),
            errors: None,
            action_required: None,
            debug_id: None,
            extra: Map::new(),
        }
    }
}

/// A successful enveloped response.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
    user_msg: Cow<'static, str>,
    extra: Map<String, Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// `200 OK` with the default message.
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
            user_msg: Cow::Borrowed(SUCCESS_MSG),
            extra: Map::new(),
        }
    }

    /// `201 Created` with the default message.
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }

    /// Replace the user-facing message.
    #[must_use]
    pub fn with_message(mut self, user_msg: impl Into<Cow<'static, str>>) -> Self {
        self.user_msg = user_msg.into();
        self
    }

    /// Repeat a value at the top level of the body.
    #[must_use]
    pub fn with_top_level(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), value);
        }
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            success: true,
            data: Some(self.data),
            user_msg: self.user_msg,
            errors: None,
            action_required: None,
            debug_id: None,
            extra: self.extra,
        };
        (self.status, Json(body)).into_response()
    }
}

/// JSON body extractor that rejects with an enveloped [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor that rejects with an enveloped [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string extractor that rejects with an enveloped [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = ApiResponse::ok(serde_json::json!({"available": true})).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["user_msg"], "Success");
        assert_eq!(body["data"]["available"], true);
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_top_level_keys_and_message() {
        let response = ApiResponse::created(serde_json::json!({"order_id": "abc"}))
            .with_message("Order Placed Successfully!")
            .with_top_level("order_id", "abc")
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["user_msg"], "Order Placed Successfully!");
        assert_eq!(body["order_id"], "abc");
        assert_eq!(body["data"]["order_id"], "abc");
    }
}
