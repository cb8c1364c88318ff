//! Phone login and profile route handlers.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sabzi_core::Email;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::UserProfile;
use crate::response::{ApiJson, ApiResponse};
use crate::services::otp::OtpService;
use crate::state::AppState;

// ============================================================================
// OTP
// ============================================================================

/// Request to send a login code.
#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Send a one-time login code by SMS.
///
/// POST /api/auth/otp/send
///
/// # Errors
///
/// Returns 400 for a missing or malformed number and 502 if the SMS provider
/// fails.
#[instrument(skip(state, req))]
pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.phone_number.trim().is_empty() {
        return Err(AppError::bad_request("Phone number required"));
    }

    let message = OtpService::new(state.pool(), state.otp(), state.tokens())
        .send_code(&req.phone_number)
        .await?;

    Ok(ApiResponse::ok(MessageResponse { message }).with_message(message))
}

/// Request to verify a login code.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub otp: String,
}

/// Verify a login code and issue an access token.
///
/// POST /api/auth/otp/verify
///
/// The account is created on first successful login.
///
/// # Errors
///
/// Returns 400 for missing fields or a wrong code.
#[instrument(skip(state, req))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.phone_number.trim().is_empty() || req.otp.trim().is_empty() {
        return Err(AppError::bad_request("Phone and OTP required"));
    }

    let login = OtpService::new(state.pool(), state.otp(), state.tokens())
        .verify_code(&req.phone_number, &req.otp)
        .await?;

    let message = login.message;
    Ok(ApiResponse::ok(login).with_message(message))
}

// ============================================================================
// Profile
// ============================================================================

/// Partial profile update.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub email: Option<String>,
}

/// Update the signed-in user's name or email.
///
/// PATCH /api/auth/profile
///
/// # Errors
///
/// Returns 400 for an invalid email.
#[instrument(skip(state, claims, req), fields(user_id = %claims.sub))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    // An empty string clears nothing; treat it as "not provided"
    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::field("email", e.to_string()))?;
    let first_name = req.first_name.as_deref().map(str::trim);

    let user = UserRepository::new(state.pool())
        .update_profile(claims.sub, first_name, email.as_ref())
        .await?;

    Ok(ApiResponse::ok(UserProfile::from(user)).with_message("Profile Updated"))
}
