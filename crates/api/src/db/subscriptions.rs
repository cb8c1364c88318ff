//! Subscription repository.

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::instrument;

use sabzi_core::{ProductId, SubscriptionFrequency, SubscriptionId, SubscriptionStatus, UserId};

use super::RepositoryError;
use crate::models::Subscription;

/// Fields for a new subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub frequency: SubscriptionFrequency,
    pub start_date: NaiveDate,
    pub next_delivery_date: NaiveDate,
}

/// Repository for recurring deliveries.
pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's subscriptions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Subscription>, RepositoryError> {
        let rows = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Get one of the user's subscriptions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: SubscriptionId,
        user_id: UserId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a subscription.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, sub), fields(user_id = %sub.user_id, product_id = %sub.product_id))]
    pub async fn create(&self, sub: &NewSubscription) -> Result<Subscription, RepositoryError> {
        let row = sqlx::query_as::<_, Subscription>(
            r"
            INSERT INTO subscriptions
                (id, user_id, product_id, quantity, frequency, start_date, next_delivery_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(SubscriptionId::generate())
        .bind(sub.user_id)
        .bind(sub.product_id)
        .bind(sub.quantity)
        .bind(sub.frequency)
        .bind(sub.start_date)
        .bind(sub.next_delivery_date)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Change quantity and frequency; `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such subscription.
    pub async fn update(
        &self,
        id: SubscriptionId,
        user_id: UserId,
        quantity: Option<i32>,
        frequency: Option<SubscriptionFrequency>,
    ) -> Result<Subscription, RepositoryError> {
        sqlx::query_as::<_, Subscription>(
            r"
            UPDATE subscriptions SET
                quantity = COALESCE($3, quantity),
                frequency = COALESCE($4, frequency)
            WHERE id = $1 AND user_id = $2
            RETURNING *
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .bind(frequency)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Move a subscription to `status`, optionally rescheduling it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such subscription.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: SubscriptionId,
        user_id: UserId,
        status: SubscriptionStatus,
        next_delivery_date: Option<NaiveDate>,
    ) -> Result<Subscription, RepositoryError> {
        sqlx::query_as::<_, Subscription>(
            r"
            UPDATE subscriptions SET
                status = $3,
                next_delivery_date = COALESCE($4, next_delivery_date)
            WHERE id = $1 AND user_id = $2
            RETURNING *
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(status)
        .bind(next_delivery_date)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a subscription. Returns `false` if the user has no such subscription.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: SubscriptionId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
