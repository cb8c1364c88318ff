//! WooCommerce REST API v3 payloads.
//!
//! Only the fields this service reads or writes are modeled; unknown fields
//! are ignored on deserialization.

use serde::{Deserialize, Serialize};

/// A product from `GET /products`.
#[derive(Debug, Clone, Deserialize)]
pub struct WcProduct {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    /// Current selling price; empty when unset.
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub images: Vec<WcImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WcImage {
    #[serde(default)]
    pub src: String,
}

/// A category from `GET /products/categories`.
#[derive(Debug, Clone, Deserialize)]
pub struct WcCategory {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub image: Option<WcImage>,
}

/// An order from `GET /orders/{id}` or `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct WcOrder {
    pub id: u64,
    #[serde(default)]
    pub line_items: Vec<WcLineItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WcLineItem {
    pub id: u64,
    pub product_id: u64,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct WcOrderCreate {
    pub payment_method: &'static str,
    pub payment_method_title: &'static str,
    pub set_paid: bool,
    pub billing: WcBilling,
    pub shipping: WcShipping,
    pub line_items: Vec<WcLineItemCreate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WcBilling {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    pub city: String,
    pub postcode: String,
    pub country: &'static str,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WcShipping {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    pub city: String,
    pub postcode: String,
    pub country: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct WcLineItemCreate {
    pub product_id: u64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<WcMeta>,
}

/// Body of `PUT /orders/{id}` for line item metadata.
#[derive(Debug, Clone, Serialize)]
pub struct WcOrderUpdate {
    pub line_items: Vec<WcLineItemUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WcLineItemUpdate {
    pub id: u64,
    pub meta_data: Vec<WcMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WcMeta {
    pub key: &'static str,
    pub value: String,
}
