//! Order repository.
//!
//! Inserts run on the caller's transaction connection so the user row lock,
//! wallet debit, order and its items commit together.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use sabzi_core::{OrderId, PaymentStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewOrder, NewOrderItem, Order, OrderItemDetail};

const ITEM_SELECT: &str = r"
    SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
           p.external_id AS product_external_id, oi.quantity,
           oi.price_at_purchase, oi.actual_weight
    FROM order_items oi
    JOIN products p ON p.id = oi.product_id
";

#[derive(sqlx::FromRow)]
struct ItemRow {
    order_id: OrderId,
    #[sqlx(flatten)]
    detail: OrderItemDetail,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Get an order owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order =
            sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(order)
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Items of one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItemDetail>, RepositoryError> {
        let sql = format!("{ITEM_SELECT} WHERE oi.order_id = $1 ORDER BY oi.id");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(order_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.detail).collect())
    }

    /// Items of several orders, grouped by order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_by_order(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItemDetail>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw: Vec<Uuid> = order_ids.iter().map(OrderId::as_uuid).collect();
        let sql = format!("{ITEM_SELECT} WHERE oi.order_id = ANY($1) ORDER BY oi.id");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(raw)
            .fetch_all(self.pool)
            .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItemDetail>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.detail);
        }
        Ok(grouped)
    }

    /// Whether the user has any order with completed payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_completed_order(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE user_id = $1 AND payment_status = $2)",
        )
        .bind(user_id)
        .bind(PaymentStatus::Completed)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Record the ID the external platform assigned to an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_external_id(
        &self,
        id: OrderId,
        external_id: &str,
        source: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE orders SET external_order_id = $2, external_source = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(external_id)
        .bind(source)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Mark an order paid with the gateway's transaction ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn mark_paid(&self, id: OrderId, transaction_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders SET payment_status = $2, transaction_id = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(PaymentStatus::Completed)
        .bind(transaction_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether the order has a line for the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM order_items WHERE order_id = $1 AND product_id = $2)",
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Store the picker's measured weight on the order's lines for a product.
    ///
    /// Returns `false` if the order has no line for the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self))]
    pub async fn record_actual_weight(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        weight: Decimal,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE order_items SET actual_weight = $3 WHERE order_id = $1 AND product_id = $2",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(weight)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert an order row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(conn: &mut PgConnection, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders
                (id, user_id, total_price, is_cod, is_otp_verified, payment_provider,
                 delivery_zone_id, coupon_id, discount_amount,
                 delivery_name, delivery_street, delivery_city, delivery_zip_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            ",
        )
        .bind(OrderId::generate())
        .bind(order.user_id)
        .bind(order.total_price)
        .bind(order.is_cod)
        .bind(order.is_otp_verified)
        .bind(&order.payment_provider)
        .bind(order.delivery_zone_id)
        .bind(order.coupon_id)
        .bind(order.discount_amount)
        .bind(&order.delivery_name)
        .bind(&order.delivery_street)
        .bind(&order.delivery_city)
        .bind(&order.delivery_zip_code)
        .fetch_one(conn)
        .await?;

        debug!(order_id = %row.id, "Inserted order");
        Ok(row)
    }

    /// Insert an order line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_item(
        conn: &mut PgConnection,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price_at_purchase)
        .execute(conn)
        .await?;
        Ok(())
    }
}
