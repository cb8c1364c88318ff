//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sabzi_core::{
    CouponId, DeliveryStatus, DeliveryZoneId, OrderId, OrderItemId, PaymentStatus, ProductId,
    UserId,
};

/// A row of the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    /// ID assigned by the external platform after a successful sync.
    pub external_order_id: Option<String>,
    pub external_source: Option<String>,
    pub is_cod: bool,
    /// The user's phone verification state when the order was placed.
    pub is_otp_verified: bool,
    pub transaction_id: Option<String>,
    pub payment_provider: Option<String>,
    pub delivery_zone_id: Option<DeliveryZoneId>,
    pub coupon_id: Option<CouponId>,
    pub discount_amount: Decimal,
    pub delivery_name: String,
    pub delivery_street: String,
    pub delivery_city: String,
    pub delivery_zip_code: String,
    pub is_subscription: bool,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub driver_location_lat: Option<f64>,
    pub driver_location_lng: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line joined with its product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    #[serde(skip)]
    pub id: OrderItemId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(skip)]
    pub product_external_id: Option<String>,
    pub quantity: Decimal,
    pub price_at_purchase: Decimal,
    /// Weight recorded by the picker, if weighed.
    pub actual_weight: Option<Decimal>,
}

/// Fields for inserting an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total_price: Decimal,
    pub is_cod: bool,
    pub is_otp_verified: bool,
    pub payment_provider: Option<String>,
    pub delivery_zone_id: Option<DeliveryZoneId>,
    pub coupon_id: Option<CouponId>,
    pub discount_amount: Decimal,
    pub delivery_name: String,
    pub delivery_street: String,
    pub delivery_city: String,
    pub delivery_zip_code: String,
}

/// Fields for inserting an order line.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub price_at_purchase: Decimal,
}

/// Driver contact and location.
#[derive(Debug, Clone, Serialize)]
pub struct DriverInfo {
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub driver_location_lat: Option<f64>,
    pub driver_location_lng: Option<f64>,
}

/// An order as shown to its owner.
///
/// Driver fields are only present while the order is out for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub user: UserId,
    pub items: Vec<OrderItemDetail>,
    pub total_price: Decimal,
    pub discount_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub is_cod: bool,
    pub is_otp_verified: bool,
    pub delivery_zone: Option<DeliveryZoneId>,
    pub delivery_name: String,
    pub delivery_street: String,
    pub delivery_city: String,
    pub delivery_zip_code: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverInfo>,
    pub created_at: DateTime<Utc>,
}

impl OrderView {
    /// Build the customer-facing view of an order.
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItemDetail>) -> Self {
        let driver = order.delivery_status.exposes_driver().then(|| DriverInfo {
            driver_name: order.driver_name,
            driver_phone: order.driver_phone,
            driver_location_lat: order.driver_location_lat,
            driver_location_lng: order.driver_location_lng,
        });

        Self {
            id: order.id,
            user: order.user_id,
            items,
            total_price: order.total_price,
            discount_amount: order.discount_amount,
            payment_status: order.payment_status,
            delivery_status: order.delivery_status,
            is_cod: order.is_cod,
            is_otp_verified: order.is_otp_verified,
            delivery_zone: order.delivery_zone_id,
            delivery_name: order.delivery_name,
            delivery_street: order.delivery_street,
            delivery_city: order.delivery_city,
            delivery_zip_code: order.delivery_zip_code,
            driver,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(status: DeliveryStatus) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::generate(),
            user_id: UserId::new(1),
            total_price: Decimal::new(24000, 2),
            payment_status: PaymentStatus::Pending,
            delivery_status: status,
            external_order_id: None,
            external_source: None,
            is_cod: true,
            is_otp_verified: true,
            transaction_id: None,
            payment_provider: None,
            delivery_zone_id: None,
            coupon_id: None,
            discount_amount: Decimal::ZERO,
            delivery_name: "Asha".to_string(),
            delivery_street: "12 MG Road".to_string(),
            delivery_city: "Pune".to_string(),
            delivery_zip_code: "411001".to_string(),
            is_subscription: false,
            driver_name: Some("Vikram".to_string()),
            driver_phone: Some("+919000000001".to_string()),
            driver_location_lat: Some(18.52),
            driver_location_lng: Some(73.85),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_driver_hidden_before_dispatch() {
        let json = serde_json::to_value(OrderView::new(order(DeliveryStatus::Packing), vec![]))
            .unwrap();
        assert!(json.get("driver_name").is_none());
        assert!(json.get("driver_location_lat").is_none());
        assert_eq!(json["delivery_status"], "PACKING");
    }

    #[test]
    fn test_driver_shown_out_for_delivery() {
        let json = serde_json::to_value(OrderView::new(
            order(DeliveryStatus::OutForDelivery),
            vec![],
        ))
        .unwrap();
        assert_eq!(json["driver_name"], "Vikram");
        assert_eq!(json["driver_phone"], "+919000000001");
    }
}
