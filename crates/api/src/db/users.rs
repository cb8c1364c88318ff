//! User repository for database operations.
//!
//! Accounts are keyed by normalized phone number and created on first OTP
//! request. Wallet debits run inside the caller's order transaction.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};

use sabzi_core::{Email, PhoneNumber, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_phone(&self, phone: &PhoneNumber) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_number = $1")
            .bind(phone)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get the account for a phone number, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(phone = %phone))]
    pub async fn get_or_create(&self, phone: &PhoneNumber) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (phone_number)
            VALUES ($1)
            ON CONFLICT (phone_number) DO UPDATE SET phone_number = EXCLUDED.phone_number
            RETURNING *
            ",
        )
        .bind(phone)
        .fetch_one(self.pool)
        .await?;

        debug!(user_id = %user.id, "Resolved user by phone");
        Ok(user)
    }

    /// Mark the phone number as verified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn mark_phone_verified(&self, id: UserId) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE users SET is_phone_verified = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Give the account staff and superuser flags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn grant_superuser(&self, id: UserId) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE users SET is_staff = TRUE, is_superuser = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Update the editable profile fields; `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        first_name: Option<&str>,
        email: Option<&Email>,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(first_name)
        .bind(email)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Assign a warehouse role to the account with this phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has the number.
    #[instrument(skip(self), fields(phone = %phone, role = %role))]
    pub async fn set_role(&self, phone: &PhoneNumber, role: UserRole) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE users SET role = $2, is_staff = is_staff OR $3, updated_at = NOW()
            WHERE phone_number = $1
            RETURNING *
            ",
        )
        .bind(phone)
        .bind(role)
        .bind(role.is_warehouse())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Lock the user row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn lock(conn: &mut PgConnection, id: UserId) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Subtract `amount` from the wallet balance.
    ///
    /// The caller must hold the row lock from [`Self::lock`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails, including when
    /// the balance would go negative.
    pub async fn debit_wallet(
        conn: &mut PgConnection,
        id: UserId,
        amount: Decimal,
    ) -> Result<Decimal, RepositoryError> {
        let (balance,): (Decimal,) = sqlx::query_as(
            r"
            UPDATE users SET wallet_balance = wallet_balance - $2, updated_at = NOW()
            WHERE id = $1
            RETURNING wallet_balance
            ",
        )
        .bind(id)
        .bind(amount)
        .fetch_one(conn)
        .await?;

        debug!(user_id = %id, %amount, %balance, "Debited wallet");
        Ok(balance)
    }
}
