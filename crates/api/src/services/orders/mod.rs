//! Order placement and warehouse picking.
//!
//! Placement is local first: the order, its lines and any wallet debit commit
//! in one transaction, then the order is mirrored to the commerce backend.
//! A failed mirror is logged and never undoes the local order.

mod error;

pub use error::OrderError;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use sabzi_core::{OrderId, PaymentMethod, UserId, round_currency};

use crate::commerce::{OrderAdapter, OrderSync, SyncLineItem};
use crate::db::{
    CatalogRepository, DeliveryZoneRepository, OrderRepository, RepositoryError, UserRepository,
};
use crate::models::{NewOrder, NewOrderItem, Order, ProductListing, User};
use crate::services::FieldErrors;
use crate::services::catalog::{ProductRef, check_quantity};
use crate::services::coupons::CouponService;
use crate::services::payment::{self, PaymentInitiation};

/// One line of a placement request.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    /// External ID or local UUID.
    pub product_id: ProductRef,
    #[serde(default = "default_quantity")]
    pub quantity: Decimal,
}

const fn default_quantity() -> Decimal {
    Decimal::ONE
}

/// Body of `POST /api/orders/place`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaceOrderRequest {
    pub payment_method: PaymentMethod,
    /// Total shown to the customer; checked against the server total.
    pub total_price: Option<Decimal>,
    pub coupon_code: Option<String>,
    pub delivery_name: String,
    pub delivery_street: String,
    pub delivery_city: String,
    pub delivery_zip_code: String,
    pub items: Vec<OrderLineRequest>,
}

/// A placed order and, for gateway payments, the payment to complete.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub payment: Option<PaymentInitiation>,
}

/// A request line matched to a catalog product.
#[derive(Debug, Clone)]
struct ResolvedLine {
    listing: ProductListing,
    quantity: Decimal,
}

/// Largest amount a `NUMERIC(10,2)` money column holds.
const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

impl ResolvedLine {
    /// Price times quantity in whole paise, `None` on overflow.
    fn line_total(&self) -> Option<Decimal> {
        self.listing
            .product
            .effective_price()
            .checked_mul(self.quantity)
            .map(round_currency)
    }
}

/// Sum of the line totals, rejected when it cannot be stored.
fn order_subtotal(lines: &[ResolvedLine]) -> Result<Decimal, OrderError> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |sum, line| {
            line.line_total().and_then(|total| sum.checked_add(total))
        })
        .filter(|sum| *sum <= MAX_ORDER_TOTAL)
        .ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.insert(
                "quantity".to_string(),
                vec!["Order total is too large.".to_string()],
            );
            OrderError::InvalidItems(errors)
        })
}

/// Order totals after the coupon discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Apply a flat discount, never taking the total below zero.
    ///
    /// Every amount is rounded to whole paise so the wallet debit and the
    /// stored order total are the same number.
    #[must_use]
    pub fn new(subtotal: Decimal, discount: Decimal) -> Self {
        let subtotal = round_currency(subtotal);
        let discount = round_currency(discount.min(subtotal).max(Decimal::ZERO));
        Self {
            subtotal,
            discount,
            total: subtotal - discount,
        }
    }
}

/// Check whether `user` may pay by `method` for `total`.
///
/// # Errors
///
/// Returns `OrderError::VerificationRequired` for cash on delivery without a
/// verified phone and `OrderError::InsufficientBalance` for wallet payments
/// the balance does not cover.
pub fn check_payment(user: &User, method: PaymentMethod, total: Decimal) -> Result<(), OrderError> {
    match method {
        PaymentMethod::Cod if !user.is_phone_verified => Err(OrderError::VerificationRequired),
        PaymentMethod::Wallet if user.wallet_balance < total => Err(OrderError::InsufficientBalance),
        _ => Ok(()),
    }
}

/// Check that the account behind a staff token still has warehouse access.
///
/// Tokens carry the staff flag for their whole lifetime, so a demoted picker
/// is only locked out once the user row is consulted.
///
/// # Errors
///
/// Returns `OrderError::StaffAccessRevoked` for a missing or demoted account.
pub fn check_staff(user: Option<&User>) -> Result<(), OrderError> {
    match user {
        Some(user) if user.is_warehouse_staff() => Ok(()),
        _ => Err(OrderError::StaffAccessRevoked),
    }
}

/// Order workflows.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    adapter: &'a dyn OrderAdapter,
    users: UserRepository<'a>,
    orders: OrderRepository<'a>,
    catalog: CatalogRepository<'a>,
    zones: DeliveryZoneRepository<'a>,
    coupons: CouponService<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, adapter: &'a dyn OrderAdapter) -> Self {
        Self {
            pool,
            adapter,
            users: UserRepository::new(pool),
            orders: OrderRepository::new(pool),
            catalog: CatalogRepository::new(pool),
            zones: DeliveryZoneRepository::new(pool),
            coupons: CouponService::new(pool),
        }
    }

    /// Place an order for `user_id`.
    ///
    /// Lines are priced from the catalog. Lines whose product cannot be found
    /// are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns the payment, coupon or line validation error that blocked the
    /// order, or a repository error.
    #[instrument(skip(self, request), fields(payment_method = ?request.payment_method))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: PlaceOrderRequest,
    ) -> Result<PlacedOrder, OrderError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        // Unverified COD is refused before anything else is looked at.
        check_payment(&user, request.payment_method, Decimal::ZERO)?;

        let lines = self.resolve_lines(&request.items).await?;
        let subtotal = order_subtotal(&lines)?;

        let coupon = match request.coupon_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                Some(self.coupons.validate(code, subtotal, user.id).await?)
            }
            _ => None,
        };
        let totals = Totals::new(
            subtotal,
            coupon.as_ref().map_or(Decimal::ZERO, |c| c.discount_amount),
        );

        if let Some(client_total) = request.total_price
            && client_total != totals.total
        {
            tracing::warn!(
                client_total = %client_total,
                server_total = %totals.total,
                "Client total differs from catalog total"
            );
        }

        let zone = self.zones.find_serviceable(&request.delivery_zip_code).await?;

        let new_order = NewOrder {
            user_id: user.id,
            total_price: totals.total,
            is_cod: request.payment_method == PaymentMethod::Cod,
            is_otp_verified: user.is_phone_verified,
            payment_provider: request.payment_method.provider().map(str::to_string),
            delivery_zone_id: zone.map(|z| z.id),
            coupon_id: coupon.as_ref().map(|c| c.id),
            discount_amount: totals.discount,
            delivery_name: request.delivery_name,
            delivery_street: request.delivery_street,
            delivery_city: request.delivery_city,
            delivery_zip_code: request.delivery_zip_code,
        };

        let mut tx = self.pool.begin().await?;

        let locked = UserRepository::lock(&mut *tx, user.id).await?;
        check_payment(&locked, request.payment_method, totals.total)?;
        if request.payment_method == PaymentMethod::Wallet {
            let balance = UserRepository::debit_wallet(&mut *tx, locked.id, totals.total).await?;
            tracing::info!(user_id = %locked.id, balance = %balance, "Wallet debited");
        }

        let order = OrderRepository::insert(&mut *tx, &new_order).await?;
        for line in &lines {
            let item = NewOrderItem {
                product_id: line.listing.product.id,
                quantity: line.quantity,
                price_at_purchase: line.listing.product.effective_price(),
            };
            OrderRepository::insert_item(&mut *tx, order.id, &item).await?;
        }

        tx.commit().await?;
        tracing::info!(order_id = %order.id, total = %order.total_price, "Order placed");

        let order = self.sync_order(order, &locked, &lines).await;

        let payment = request
            .payment_method
            .provider()
            .map(|provider| payment::initiate(provider, order.total_price));

        Ok(PlacedOrder { order, payment })
    }

    /// Match request lines to products and validate their quantities.
    async fn resolve_lines(
        &self,
        items: &[OrderLineRequest],
    ) -> Result<Vec<ResolvedLine>, OrderError> {
        let mut lines = Vec::with_capacity(items.len());
        let mut errors = FieldErrors::new();

        for item in items {
            let listing = if item.product_id.is_blank() {
                None
            } else {
                self.catalog.resolve(item.product_id.as_str()).await?
            };

            let Some(listing) = listing.filter(|l| l.product.is_active) else {
                tracing::warn!(product_id = %item.product_id, "Skipping unknown product");
                continue;
            };

            if let Err(e) = check_quantity(&listing, item.quantity) {
                errors.entry("quantity".to_string()).or_default().push(e.to_string());
                continue;
            }

            lines.push(ResolvedLine {
                listing,
                quantity: item.quantity,
            });
        }

        if !errors.is_empty() {
            return Err(OrderError::InvalidItems(errors));
        }
        if lines.is_empty() {
            let mut errors = FieldErrors::new();
            errors.insert(
                "items".to_string(),
                vec!["No available products in this order.".to_string()],
            );
            return Err(OrderError::InvalidItems(errors));
        }
        Ok(lines)
    }

    /// Mirror a committed order to the commerce backend.
    ///
    /// Returns the order with its external ID when the mirror succeeded.
    async fn sync_order(&self, order: Order, customer: &User, lines: &[ResolvedLine]) -> Order {
        let items: Vec<SyncLineItem> = lines
            .iter()
            .map(|line| SyncLineItem {
                product_external_id: line.listing.product.external_id.clone(),
                quantity: line.quantity,
            })
            .collect();

        let result = self
            .adapter
            .sync_order(OrderSync {
                order: &order,
                customer,
                items: &items,
            })
            .await;

        match result {
            Ok(Some(external_id)) => {
                tracing::info!(order_id = %order.id, external_id = %external_id, "Order synced");
                Order {
                    external_order_id: Some(external_id),
                    ..order
                }
            }
            Ok(None) => order,
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "External order sync failed");
                order
            }
        }
    }

    /// Record a picker's measured weight for one product of an order.
    ///
    /// The weight is stored locally, then pushed to the commerce backend.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::StaffAccessRevoked` when `picker` no longer has
    /// warehouse access, `OrderError::OrderNotFound`,
    /// `OrderError::ProductNotFound` or `OrderError::ItemNotInOrder` when the
    /// line cannot be found, and the backend's error when it rejects the
    /// update.
    #[instrument(skip(self))]
    pub async fn update_item_weight(
        &self,
        picker: UserId,
        order_id: OrderId,
        product: &ProductRef,
        weight: Decimal,
    ) -> Result<(), OrderError> {
        check_staff(self.users.get_by_id(picker).await?.as_ref())?;

        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        let listing = self
            .catalog
            .resolve(product.as_str())
            .await?
            .ok_or(OrderError::ProductNotFound)?;

        if !self
            .orders
            .record_actual_weight(order.id, listing.product.id, weight)
            .await?
        {
            return Err(OrderError::ItemNotInOrder);
        }

        if !self
            .adapter
            .update_item_weight(&order, &listing.product, weight)
            .await?
        {
            return Err(OrderError::ItemNotInOrder);
        }

        tracing::info!(
            order_id = %order.id,
            product_id = %listing.product.id,
            weight = %weight,
            "Item weighed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use sabzi_core::{PhoneNumber, UserRole};

    use super::*;
    use crate::services::catalog::tests::listing;

    fn line(base: i64, unit: &str, quantity: Decimal) -> ResolvedLine {
        ResolvedLine {
            listing: listing("Desi Tomato", unit, base, None),
            quantity,
        }
    }

    fn user(verified: bool, wallet: i64) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(3),
            phone_number: PhoneNumber::parse("9876543210").unwrap(),
            first_name: "Asha".to_string(),
            last_name: String::new(),
            email: None,
            is_phone_verified: verified,
            wallet_balance: Decimal::new(wallet, 0),
            role: UserRole::Customer,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_cod_requires_verified_phone() {
        let err = check_payment(&user(false, 0), PaymentMethod::Cod, Decimal::new(100, 0))
            .unwrap_err();
        assert!(matches!(err, OrderError::VerificationRequired));
        assert!(check_payment(&user(true, 0), PaymentMethod::Cod, Decimal::new(100, 0)).is_ok());
    }

    #[test]
    fn test_wallet_needs_full_balance() {
        let err = check_payment(&user(true, 99), PaymentMethod::Wallet, Decimal::new(100, 0))
            .unwrap_err();
        assert_eq!(err.to_string(), "Insufficient Wallet Balance");
        assert!(
            check_payment(&user(false, 100), PaymentMethod::Wallet, Decimal::new(100, 0)).is_ok()
        );
    }

    #[test]
    fn test_gateway_skips_verification() {
        assert!(check_payment(&user(false, 0), PaymentMethod::Razorpay, Decimal::new(500, 0)).is_ok());
    }

    #[test]
    fn test_discount_capped_at_subtotal() {
        let totals = Totals::new(Decimal::new(40, 0), Decimal::new(50, 0));
        assert_eq!(totals.discount, Decimal::new(40, 0));
        assert_eq!(totals.total, Decimal::ZERO);

        let totals = Totals::new(Decimal::new(200, 0), Decimal::new(50, 0));
        assert_eq!(totals.total, Decimal::new(150, 0));
    }

    #[test]
    fn test_totals_rounded_to_paise() {
        // 61/kg for 125 g is 7.625
        let lines = [line(61, "kg", Decimal::new(125, 3))];
        assert_eq!(lines[0].line_total(), Some(Decimal::new(763, 2)));

        let totals = Totals::new(order_subtotal(&lines).unwrap(), Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(763, 2));
        assert!(totals.total.scale() <= 2);

        let totals = Totals::new(Decimal::new(7625, 3), Decimal::new(1005, 3));
        assert_eq!(totals.subtotal, Decimal::new(763, 2));
        assert_eq!(totals.discount, Decimal::new(101, 2));
        assert_eq!(totals.total, Decimal::new(662, 2));
        assert!(totals.total.scale() <= 2);
    }

    #[test]
    fn test_wallet_check_uses_rounded_total() {
        let lines = [line(61, "kg", Decimal::new(125, 3))];
        let totals = Totals::new(order_subtotal(&lines).unwrap(), Decimal::ZERO);

        let mut buyer = user(true, 0);
        buyer.wallet_balance = Decimal::new(7625, 3);
        assert!(matches!(
            check_payment(&buyer, PaymentMethod::Wallet, totals.total).unwrap_err(),
            OrderError::InsufficientBalance
        ));
        buyer.wallet_balance = Decimal::new(763, 2);
        assert!(check_payment(&buyer, PaymentMethod::Wallet, totals.total).is_ok());
    }

    #[test]
    fn test_line_total_overflow_is_a_quantity_error() {
        let lines = [line(1_000_000, "kg", Decimal::MAX)];
        assert_eq!(lines[0].line_total(), None);

        let OrderError::InvalidItems(errors) = order_subtotal(&lines).unwrap_err() else {
            panic!("expected invalid items");
        };
        assert_eq!(errors["quantity"], vec!["Order total is too large.".to_string()]);
    }

    #[test]
    fn test_subtotal_beyond_money_column_rejected() {
        let lines = [line(100, "kg", Decimal::new(9_999_999, 0))];
        assert!(matches!(
            order_subtotal(&lines).unwrap_err(),
            OrderError::InvalidItems(_)
        ));

        let lines = [line(9, "kg", Decimal::new(9_999_999, 0))];
        assert_eq!(order_subtotal(&lines).unwrap(), Decimal::new(89_999_991, 0));
    }

    #[test]
    fn test_demoted_picker_loses_access() {
        let mut picker = user(true, 0);
        picker.role = UserRole::Picker;
        assert!(check_staff(Some(&picker)).is_ok());

        picker.role = UserRole::Customer;
        assert!(matches!(
            check_staff(Some(&picker)).unwrap_err(),
            OrderError::StaffAccessRevoked
        ));

        picker.is_staff = true;
        assert!(check_staff(Some(&picker)).is_ok());
        assert!(check_staff(None).is_err());
    }

    #[test]
    fn test_request_defaults() {
        let request: PlaceOrderRequest = serde_json::from_value(serde_json::json!({
            "items": [{"product_id": 812}, {"product_id": "a-uuid", "quantity": "1.5"}]
        }))
        .unwrap();
        assert_eq!(request.payment_method, PaymentMethod::Cod);
        assert_eq!(request.items[0].quantity, Decimal::ONE);
        assert_eq!(request.items[0].product_id.as_str(), "812");
        assert_eq!(request.items[1].quantity, Decimal::new(15, 1));
    }

    #[test]
    fn test_card_alias_maps_to_gateway() {
        let request: PlaceOrderRequest =
            serde_json::from_value(serde_json::json!({"payment_method": "CARD"})).unwrap();
        assert_eq!(request.payment_method, PaymentMethod::Razorpay);
        assert_eq!(request.payment_method.provider(), Some("RAZORPAY"));
    }
}
