//! Address repository.
//!
//! Setting an address as default clears the flag on the user's other
//! addresses in the same transaction; a partial unique index backs this up.

use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use sabzi_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

/// Repository for saved addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's addresses, default first, then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, Address>(
            r"
            SELECT * FROM addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Get one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row =
            sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(row)
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_default(&mut tx, user_id, None).await?;
        }

        let row = sqlx::query_as::<_, Address>(
            r"
            INSERT INTO addresses (user_id, name, street, city, zip_code, type, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(user_id)
        .bind(input.name.trim())
        .bind(input.street.trim())
        .bind(input.city.trim())
        .bind(input.zip_code.trim())
        .bind(input.address_type)
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "default address"))?;

        tx.commit().await?;
        Ok(row)
    }

    /// Replace an address's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: AddressId,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_default(&mut tx, user_id, Some(id)).await?;
        }

        let row = sqlx::query_as::<_, Address>(
            r"
            UPDATE addresses SET
                name = $3, street = $4, city = $5, zip_code = $6, type = $7, is_default = $8
            WHERE id = $1 AND user_id = $2
            RETURNING *
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(input.name.trim())
        .bind(input.street.trim())
        .bind(input.city.trim())
        .bind(input.zip_code.trim())
        .bind(input.address_type)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "default address"))?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(row)
    }

    /// Delete an address. Returns `false` if the user has no such address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn clear_default(
    conn: &mut PgConnection,
    user_id: UserId,
    except: Option<AddressId>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE addresses SET is_default = FALSE
        WHERE user_id = $1 AND is_default AND ($2::int IS NULL OR id <> $2)
        ",
    )
    .bind(user_id)
    .bind(except)
    .execute(conn)
    .await?;
    Ok(())
}
