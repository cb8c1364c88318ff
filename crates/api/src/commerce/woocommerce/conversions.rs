//! Mapping between WooCommerce payloads and local types.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use sabzi_core::UnitId;

use super::types::{
    WcBilling, WcCategory, WcLineItemCreate, WcMeta, WcOrderCreate, WcProduct, WcShipping,
};
use crate::commerce::{CatalogCategory, CatalogProduct, OrderSync};
use crate::db::ExternalProductUpsert;

/// Value stored in `external_source` for synced rows.
pub const SOURCE: &str = "woocommerce";

const COUNTRY: &str = "IN";

/// Parse a WooCommerce price string; blank or malformed prices are zero.
#[must_use]
pub fn parse_price(raw: &str) -> Decimal {
    raw.trim().parse().unwrap_or(Decimal::ZERO)
}

impl WcProduct {
    /// List price: `regular_price`, or `price` when no regular price is set.
    #[must_use]
    pub fn list_price(&self) -> Decimal {
        if self.regular_price.trim().is_empty() {
            parse_price(&self.price)
        } else {
            parse_price(&self.regular_price)
        }
    }

    /// Selling price when it differs from the list price.
    #[must_use]
    pub fn sale_price(&self) -> Option<Decimal> {
        if self.price.trim().is_empty() {
            return None;
        }
        let price = parse_price(&self.price);
        (price != self.list_price()).then_some(price)
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == "publish"
    }

    fn primary_image(&self) -> Option<String> {
        self.images
            .iter()
            .map(|i| i.src.trim())
            .find(|src| !src.is_empty())
            .map(str::to_string)
    }

    /// Fields for upserting this product into the local catalog.
    #[must_use]
    pub fn to_upsert(&self, default_unit_id: UnitId) -> ExternalProductUpsert {
        ExternalProductUpsert {
            external_id: self.id.to_string(),
            external_source: SOURCE,
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            image: self.primary_image(),
            base_price: self.list_price(),
            discounted_price: self.sale_price(),
            is_active: self.is_published(),
            default_unit_id,
        }
    }
}

impl From<WcProduct> for CatalogProduct {
    fn from(wc: WcProduct) -> Self {
        let base_price = wc.list_price();
        let discounted_price = wc.sale_price();
        let image = wc.primary_image();
        let is_active = wc.is_published();

        // Everything in the store is certified organic.
        Self {
            id: wc.id.to_string(),
            name: wc.name,
            slug: wc.slug,
            description: wc.description,
            image,
            base_price,
            discounted_price,
            pricing_unit: None,
            weight_value: None,
            weight_unit: None,
            is_organic: true,
            trust_badge: Self::badge_for(true),
            is_active,
            external_id: Some(wc.id.to_string()),
        }
    }
}

impl From<WcCategory> for CatalogCategory {
    fn from(wc: WcCategory) -> Self {
        Self {
            id: wc.id.to_string(),
            name: wc.name,
            slug: wc.slug,
            image: wc.image.map(|i| i.src).unwrap_or_default(),
        }
    }
}

/// Build the `POST /orders` body for a placed order.
///
/// Returns `None` when no line maps to a WooCommerce product. WooCommerce
/// only accepts whole quantities, so fractional weights are rounded up and
/// the exact amount is attached as line metadata.
#[must_use]
pub fn order_payload(sync: &OrderSync<'_>) -> Option<WcOrderCreate> {
    let line_items: Vec<WcLineItemCreate> = sync
        .items
        .iter()
        .filter_map(|item| {
            let product_id = item.product_external_id.as_deref()?.parse::<u64>().ok()?;
            let whole = item.quantity.ceil().to_u32().unwrap_or(1).max(1);
            let meta_data = if item.quantity.fract().is_zero() {
                Vec::new()
            } else {
                vec![WcMeta {
                    key: "Ordered Quantity",
                    value: item.quantity.normalize().to_string(),
                }]
            };
            Some(WcLineItemCreate {
                product_id,
                quantity: whole,
                meta_data,
            })
        })
        .collect();

    if line_items.is_empty() {
        return None;
    }

    let order = sync.order;
    let customer = sync.customer;
    let first_name = if customer.first_name.trim().is_empty() {
        "Guest".to_string()
    } else {
        customer.first_name.clone()
    };
    let email = customer.email.as_ref().map_or_else(
        || format!("{}@example.com", customer.phone_number),
        ToString::to_string,
    );

    let (payment_method, payment_method_title) = if order.is_cod {
        ("cod", "Cash on Delivery")
    } else {
        ("other", "Wallet/Other")
    };

    Some(WcOrderCreate {
        payment_method,
        payment_method_title,
        set_paid: false,
        billing: WcBilling {
            first_name: first_name.clone(),
            last_name: customer.last_name.clone(),
            address_1: order.delivery_street.clone(),
            city: order.delivery_city.clone(),
            postcode: order.delivery_zip_code.clone(),
            country: COUNTRY,
            email,
            phone: customer.phone_number.to_string(),
        },
        shipping: WcShipping {
            first_name,
            last_name: customer.last_name.clone(),
            address_1: order.delivery_street.clone(),
            city: order.delivery_city.clone(),
            postcode: order.delivery_zip_code.clone(),
            country: COUNTRY,
        },
        line_items,
    })
}

/// Line metadata recording a picker's measured weight.
#[must_use]
pub fn weight_meta(weight: Decimal) -> Vec<WcMeta> {
    vec![
        WcMeta {
            key: "Actual Weight",
            value: format!("{} kg", weight.normalize()),
        },
        WcMeta {
            key: "Picker Status",
            value: "Weighed".to_string(),
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use sabzi_core::{
        DeliveryStatus, OrderId, PaymentStatus, PhoneNumber, UserId, UserRole,
    };

    use super::*;
    use crate::commerce::SyncLineItem;
    use crate::commerce::woocommerce::types::WcImage;
    use crate::models::{Order, User};

    fn wc_product(price: &str, regular: &str) -> WcProduct {
        WcProduct {
            id: 812,
            name: "Desi Tomato".to_string(),
            slug: "desi-tomato".to_string(),
            description: "<p>Farm fresh</p>".to_string(),
            status: "publish".to_string(),
            price: price.to_string(),
            regular_price: regular.to_string(),
            images: vec![WcImage { src: "https://cdn.example/tomato.jpg".to_string() }],
        }
    }

    fn customer(first_name: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(7),
            phone_number: PhoneNumber::parse("9876543210").unwrap(),
            first_name: first_name.to_string(),
            last_name: String::new(),
            email: None,
            is_phone_verified: true,
            wallet_balance: Decimal::ZERO,
            role: UserRole::Customer,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn order(is_cod: bool) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::generate(),
            user_id: UserId::new(7),
            total_price: Decimal::new(180, 0),
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::Pending,
            external_order_id: None,
            external_source: None,
            is_cod,
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
            driver_name: None,
            driver_phone: None,
            driver_location_lat: None,
            driver_location_lng: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sale_price_only_when_discounted() {
        let on_sale = wc_product("45", "60");
        assert_eq!(on_sale.list_price(), Decimal::new(60, 0));
        assert_eq!(on_sale.sale_price(), Some(Decimal::new(45, 0)));

        let full_price = wc_product("60", "60");
        assert_eq!(full_price.sale_price(), None);

        let no_regular = wc_product("30", "");
        assert_eq!(no_regular.list_price(), Decimal::new(30, 0));
        assert_eq!(no_regular.sale_price(), None);
    }

    #[test]
    fn test_blank_price_is_zero() {
        assert_eq!(parse_price(""), Decimal::ZERO);
        assert_eq!(parse_price("abc"), Decimal::ZERO);
        assert_eq!(parse_price(" 12.50 "), Decimal::new(1250, 2));
    }

    #[test]
    fn test_catalog_product_from_wc() {
        let product = CatalogProduct::from(wc_product("45", "60"));
        assert_eq!(product.id, "812");
        assert_eq!(product.external_id.as_deref(), Some("812"));
        assert_eq!(product.image.as_deref(), Some("https://cdn.example/tomato.jpg"));
        assert!(product.is_active);
        assert!(product.pricing_unit.is_none());
    }

    #[test]
    fn test_upsert_marks_drafts_inactive() {
        let mut draft = wc_product("45", "60");
        draft.status = "draft".to_string();
        let upsert = draft.to_upsert(UnitId::new(2));
        assert!(!upsert.is_active);
        assert_eq!(upsert.external_source, "woocommerce");
        assert_eq!(upsert.default_unit_id, UnitId::new(2));
    }

    #[test]
    fn test_category_image_src() {
        let category = CatalogCategory::from(WcCategory {
            id: 15,
            name: "Vegetables".to_string(),
            slug: "vegetables".to_string(),
            image: Some(WcImage { src: "https://cdn.example/veg.png".to_string() }),
        });
        assert_eq!(category.image, "https://cdn.example/veg.png");

        let bare = CatalogCategory::from(WcCategory {
            id: 16,
            name: "Staples".to_string(),
            slug: "staples".to_string(),
            image: None,
        });
        assert_eq!(bare.image, "");
    }

    #[test]
    fn test_order_payload_skips_unmapped_lines() {
        let order = order(true);
        let customer = customer("");
        let items = vec![
            SyncLineItem { product_external_id: Some("812".to_string()), quantity: Decimal::new(15, 1) },
            SyncLineItem { product_external_id: None, quantity: Decimal::ONE },
        ];
        let payload = order_payload(&OrderSync {
            order: &order,
            customer: &customer,
            items: &items,
        })
        .unwrap();

        assert_eq!(payload.payment_method, "cod");
        assert_eq!(payload.billing.first_name, "Guest");
        assert_eq!(payload.billing.email, "+919876543210@example.com");
        assert_eq!(payload.billing.country, "IN");
        assert_eq!(payload.line_items.len(), 1);
        assert_eq!(payload.line_items[0].product_id, 812);
        assert_eq!(payload.line_items[0].quantity, 2);
        assert_eq!(payload.line_items[0].meta_data[0].value, "1.5");
    }

    #[test]
    fn test_order_payload_none_without_mapped_items() {
        let order = order(false);
        let customer = customer("Asha");
        let items = vec![SyncLineItem { product_external_id: None, quantity: Decimal::ONE }];
        assert!(
            order_payload(&OrderSync {
                order: &order,
                customer: &customer,
                items: &items,
            })
            .is_none()
        );
    }

    #[test]
    fn test_weight_meta() {
        let meta = weight_meta(Decimal::new(1250, 3));
        assert_eq!(meta[0].value, "1.25 kg");
        assert_eq!(meta[1].value, "Weighed");
    }
}
