//! Staff account management.

use sqlx::PgPool;
use tracing::info;

use sabzi_api::db::{RepositoryError, UserRepository};
use sabzi_core::{PhoneNumber, UserRole};

use super::CommandError;

fn parse_phone(phone: &str) -> Result<PhoneNumber, CommandError> {
    PhoneNumber::parse(phone).map_err(|e| CommandError::InvalidInput(format!("{phone}: {e}")))
}

fn not_registered(phone: &PhoneNumber) -> CommandError {
    CommandError::InvalidInput(format!("No account registered with {phone}; log in once first"))
}

/// Assign a role to the account with this phone number.
///
/// Warehouse roles also set the staff flag.
///
/// # Errors
///
/// Returns an error if the number is invalid or has no account.
pub async fn promote(pool: &PgPool, phone: &str, role: UserRole) -> Result<(), CommandError> {
    let phone = parse_phone(phone)?;

    let user = match UserRepository::new(pool).set_role(&phone, role).await {
        Err(RepositoryError::NotFound) => return Err(not_registered(&phone)),
        other => other?,
    };

    info!(user_id = %user.id, role = %user.role, is_staff = user.is_staff, "Role updated");
    Ok(())
}

/// Give the account with this phone number staff and superuser flags.
///
/// # Errors
///
/// Returns an error if the number is invalid or has no account.
pub async fn superuser(pool: &PgPool, phone: &str) -> Result<(), CommandError> {
    let phone = parse_phone(phone)?;
    let users = UserRepository::new(pool);

    let user = users
        .get_by_phone(&phone)
        .await?
        .ok_or_else(|| not_registered(&phone))?;
    let user = users.grant_superuser(user.id).await?;

    info!(user_id = %user.id, "Superuser granted");
    Ok(())
}
