//! WooCommerce backend.
//!
//! Talks to the WooCommerce REST API v3 with HTTP basic auth (consumer key
//! and secret). Requests use fixed timeouts and are never retried.

pub mod conversions;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};
use url::Url;

use self::conversions::{SOURCE, order_payload, weight_meta};
use self::types::{WcCategory, WcLineItemUpdate, WcOrder, WcOrderUpdate, WcProduct};
use super::{
    CatalogCategory, CatalogProduct, CommerceError, OrderAdapter, OrderSync, ProductAdapter,
    ProductQuery,
};
use crate::config::{CommerceBackend, WooCommerceConfig};
use crate::db::{CatalogRepository, OrderRepository};
use crate::models::{Order, Product};

const READ_TIMEOUT: Duration = Duration::from_secs(15);
const CREATE_TIMEOUT: Duration = Duration::from_secs(30);
const CATEGORY_PAGE_SIZE: u32 = 50;

/// Unit assigned to products created by a sync.
const DEFAULT_UNIT_SYMBOL: &str = "pc";

/// WooCommerce REST client.
#[derive(Clone)]
pub struct WooCommerceClient {
    client: reqwest::Client,
    base_url: Url,
    consumer_key: String,
    consumer_secret: SecretString,
}

impl WooCommerceClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &WooCommerceConfig) -> Result<Self, CommerceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("sabzi-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, CommerceError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| CommerceError::Parse(format!("invalid endpoint {path}: {e}")))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url, timeout: Duration) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.consumer_key, Some(self.consumer_secret.expose_secret()))
            .timeout(timeout)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CommerceError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CommerceError::Parse(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CommerceError> {
        let url = self.endpoint(path, params)?;
        let response = self
            .request(reqwest::Method::GET, url, READ_TIMEOUT)
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Raw product JSON with WooCommerce's own status, for the legacy proxy
    /// endpoint. Client query parameters are forwarded; `per_page` defaults
    /// to 100.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not JSON.
    #[instrument(skip(self))]
    pub async fn products_raw(
        &self,
        params: &[(String, String)],
    ) -> Result<(StatusCode, serde_json::Value), CommerceError> {
        let mut url = self.endpoint("products", &[])?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            if !params.iter().any(|(key, _)| key == "per_page") {
                pairs.append_pair("per_page", "100");
            }
        }

        let response = self
            .request(reqwest::Method::GET, url, READ_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        let body = response
            .json()
            .await
            .map_err(|e| CommerceError::Parse(e.to_string()))?;
        Ok((status, body))
    }

    /// Published products.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn list_products(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
        category_id: Option<&str>,
    ) -> Result<Vec<WcProduct>, CommerceError> {
        let mut params = vec![
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("status", "publish".to_string()),
        ];
        if let Some(search) = search {
            params.push(("search", search.to_string()));
        }
        if let Some(category_id) = category_id {
            params.push(("category", category_id.to_string()));
        }
        self.get("products", &params).await
    }

    /// The product with this slug, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<WcProduct>, CommerceError> {
        let products: Vec<WcProduct> = self
            .get(
                "products",
                &[("slug", slug.to_string()), ("per_page", "1".to_string())],
            )
            .await?;
        Ok(products.into_iter().next())
    }

    /// The product with this numeric ID.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, including 404 for unknown IDs.
    pub async fn product_by_id(&self, id: u64) -> Result<WcProduct, CommerceError> {
        self.get(&format!("products/{id}"), &[]).await
    }

    /// Product categories.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn list_categories(&self) -> Result<Vec<WcCategory>, CommerceError> {
        self.get(
            "products/categories",
            &[("per_page", CATEGORY_PAGE_SIZE.to_string())],
        )
        .await
    }

    /// Create an order; succeeds only on `201 Created`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or WooCommerce does not create the order.
    pub async fn create_order<B: Serialize + Sync>(&self, body: &B) -> Result<WcOrder, CommerceError> {
        let url = self.endpoint("orders", &[])?;
        let response = self
            .request(reqwest::Method::POST, url, CREATE_TIMEOUT)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let message = response.text().await.unwrap_or_default();
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CommerceError::Parse(e.to_string()))
    }

    /// Fetch an order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn get_order(&self, id: &str) -> Result<WcOrder, CommerceError> {
        self.get(&format!("orders/{id}"), &[]).await
    }

    /// Apply a partial update to an order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn update_order(&self, id: &str, body: &WcOrderUpdate) -> Result<WcOrder, CommerceError> {
        let url = self.endpoint(&format!("orders/{id}"), &[])?;
        let response = self
            .request(reqwest::Method::PUT, url, READ_TIMEOUT)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }
}

/// Catalog served by WooCommerce.
#[derive(Clone)]
pub struct WooCommerceProductAdapter {
    client: WooCommerceClient,
    pool: PgPool,
}

impl WooCommerceProductAdapter {
    #[must_use]
    pub const fn new(client: WooCommerceClient, pool: PgPool) -> Self {
        Self { client, pool }
    }

    /// WooCommerce category ID stored on the local category with this slug.
    async fn external_category_id(&self, slug: &str) -> Result<Option<String>, CommerceError> {
        let category = CatalogRepository::new(&self.pool)
            .get_category_by_slug(slug)
            .await?;
        Ok(category
            .and_then(|c| c.image)
            .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())))
    }
}

#[async_trait]
impl ProductAdapter for WooCommerceProductAdapter {
    fn backend(&self) -> CommerceBackend {
        CommerceBackend::WooCommerce
    }

    #[instrument(skip(self))]
    async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<CatalogProduct>, CommerceError> {
        let category_id = match query.category.as_deref() {
            Some(slug) => self.external_category_id(slug).await?,
            None => None,
        };

        match self
            .client
            .list_products(
                query.page,
                query.per_page,
                query.search.as_deref(),
                category_id.as_deref(),
            )
            .await
        {
            Ok(products) => Ok(products.into_iter().map(CatalogProduct::from).collect()),
            Err(e) => {
                error!(error = %e, "WooCommerce product fetch failed");
                Ok(Vec::new())
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_product(&self, identifier: &str) -> Result<Option<CatalogProduct>, CommerceError> {
        match self.client.product_by_slug(identifier).await {
            Ok(Some(product)) => return Ok(Some(product.into())),
            Ok(None) => {}
            Err(e) => error!(error = %e, "WooCommerce product lookup by slug failed"),
        }

        let Ok(id) = identifier.parse::<u64>() else {
            return Ok(None);
        };

        match self.client.product_by_id(id).await {
            Ok(product) => Ok(Some(product.into())),
            Err(CommerceError::Api { status: 404, .. }) => Ok(None),
            Err(e) => {
                error!(error = %e, "WooCommerce product lookup by ID failed");
                Ok(None)
            }
        }
    }

    async fn list_categories(&self) -> Result<Vec<CatalogCategory>, CommerceError> {
        match self.client.list_categories().await {
            Ok(categories) => Ok(categories.into_iter().map(CatalogCategory::from).collect()),
            Err(e) => {
                error!(error = %e, "WooCommerce category fetch failed");
                Ok(Vec::new())
            }
        }
    }

    #[instrument(skip(self))]
    async fn sync_to_local(&self) -> Result<u64, CommerceError> {
        let repo = CatalogRepository::new(&self.pool);
        let unit = repo
            .get_unit_by_symbol(DEFAULT_UNIT_SYMBOL)
            .await?
            .ok_or_else(|| {
                CommerceError::Parse(format!(
                    "unit '{DEFAULT_UNIT_SYMBOL}' missing; run `sabzi-cli seed catalog` first"
                ))
            })?;

        let products = self
            .client
            .list_products(1, ProductQuery::MAX_PER_PAGE, None, None)
            .await?;

        let mut created = 0u64;
        for product in &products {
            if repo.upsert_external(&product.to_upsert(unit.id)).await? {
                created += 1;
            }
        }

        info!(created, total = products.len(), "WooCommerce sync complete");
        Ok(created)
    }
}

/// Orders mirrored to WooCommerce.
#[derive(Clone)]
pub struct WooCommerceOrderAdapter {
    client: WooCommerceClient,
    pool: PgPool,
}

impl WooCommerceOrderAdapter {
    #[must_use]
    pub const fn new(client: WooCommerceClient, pool: PgPool) -> Self {
        Self { client, pool }
    }
}

#[async_trait]
impl OrderAdapter for WooCommerceOrderAdapter {
    #[instrument(skip(self, sync), fields(order_id = %sync.order.id))]
    async fn sync_order(&self, sync: OrderSync<'_>) -> Result<Option<String>, CommerceError> {
        let Some(payload) = order_payload(&sync) else {
            warn!("No items with external IDs, skipping WooCommerce sync");
            return Ok(None);
        };

        let created = self.client.create_order(&payload).await?;
        let external_id = created.id.to_string();

        OrderRepository::new(&self.pool)
            .set_external_id(sync.order.id, &external_id, SOURCE)
            .await?;

        info!(external_id = %external_id, "Order synced to WooCommerce");
        Ok(Some(external_id))
    }

    #[instrument(skip(self, order, product), fields(order_id = %order.id, product_id = %product.id))]
    async fn update_item_weight(
        &self,
        order: &Order,
        product: &Product,
        weight: Decimal,
    ) -> Result<bool, CommerceError> {
        let external_order_id = order
            .external_order_id
            .as_deref()
            .ok_or(CommerceError::OrderNotSynced)?;
        let external_product_id = product
            .external_id
            .as_deref()
            .and_then(|id| id.parse::<u64>().ok())
            .ok_or(CommerceError::ProductNotMapped)?;

        let wc_order = self.client.get_order(external_order_id).await?;
        let line = wc_order
            .line_items
            .iter()
            .find(|item| item.product_id == external_product_id)
            .ok_or(CommerceError::ItemNotFound)?;

        let update = WcOrderUpdate {
            line_items: vec![WcLineItemUpdate {
                id: line.id,
                meta_data: weight_meta(weight),
            }],
        };
        self.client.update_order(external_order_id, &update).await?;

        info!(line_item = line.id, %weight, "Recorded weight on WooCommerce order");
        Ok(true)
    }
}
