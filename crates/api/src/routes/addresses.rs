//! Saved address route handlers.
//!
//! Listed default first, then newest. Marking an address as default clears
//! the flag on the user's other addresses in the same transaction.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use sabzi_core::AddressId;

use crate::db::AddressRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{AddressInput, AddressPatch};
use crate::response::{ApiJson, ApiPath, ApiResponse};
use crate::services::FieldErrors;
use crate::state::AppState;

const ADDRESS_NOT_FOUND: &str = "Address not found";

fn validate(input: &AddressInput) -> Result<(), AppError> {
    let blank = input.blank_fields();
    if blank.is_empty() {
        return Ok(());
    }

    let errors: FieldErrors = blank
        .into_iter()
        .map(|field| (field.to_string(), vec!["This field may not be blank.".to_string()]))
        .collect();
    Err(AppError::Validation(errors))
}

/// GET /api/addresses
///
/// # Errors
///
/// Returns `AppError` if the query fails.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(claims.sub)
        .await?;
    Ok(ApiResponse::ok(addresses))
}

/// GET /api/addresses/{id}
///
/// # Errors
///
/// Returns 404 if the user has no such address.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<impl IntoResponse, AppError> {
    let address = AddressRepository::new(state.pool())
        .get(id, claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found(ADDRESS_NOT_FOUND))?;
    Ok(ApiResponse::ok(address))
}

/// POST /api/addresses
///
/// # Errors
///
/// Returns 400 with the blank fields.
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<impl IntoResponse, AppError> {
    validate(&input)?;

    let address = AddressRepository::new(state.pool())
        .create(claims.sub, &input)
        .await?;
    Ok(ApiResponse::created(address))
}

/// PUT|PATCH /api/addresses/{id}
///
/// Fields missing from the body keep their stored values.
///
/// # Errors
///
/// Returns 404 if the user has no such address and 400 if a required field
/// ends up blank.
#[instrument(skip(state, claims, patch), fields(user_id = %claims.sub))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(patch): ApiJson<AddressPatch>,
) -> Result<impl IntoResponse, AppError> {
    let repo = AddressRepository::new(state.pool());
    let current = repo
        .get(id, claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found(ADDRESS_NOT_FOUND))?;

    let input = patch.apply(&current);
    validate(&input)?;

    let address = repo.update(id, claims.sub, &input).await?;
    Ok(ApiResponse::ok(address))
}

/// DELETE /api/addresses/{id}
///
/// # Errors
///
/// Returns 404 if the user has no such address.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<impl IntoResponse, AppError> {
    if !AddressRepository::new(state.pool())
        .delete(id, claims.sub)
        .await?
    {
        return Err(AppError::not_found(ADDRESS_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sabzi_core::AddressType;

    use super::*;

    #[test]
    fn test_validate_lists_every_blank_field() {
        let input = AddressInput {
            name: "Home".to_string(),
            street: String::new(),
            city: " ".to_string(),
            zip_code: "411001".to_string(),
            address_type: AddressType::Home,
            is_default: false,
        };

        let AppError::Validation(errors) = validate(&input).unwrap_err() else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.keys().collect::<Vec<_>>(), ["city", "street"]);
    }
}
