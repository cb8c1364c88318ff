//! Catalog sync from the configured commerce backend.

use sabzi_api::commerce::build_adapters;
use sabzi_api::config::{ApiConfig, CommerceBackend};
use sabzi_api::services::catalog::ProductService;

/// Import products from the external platform into the local catalog.
///
/// Uses the same configuration as the API server; with the local backend
/// there is nothing to import.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the platform is unreachable,
/// or an upsert fails.
pub async fn products() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env()?;
    if config.backend == CommerceBackend::Local {
        tracing::warn!("PRODUCT_BACKEND is local; nothing to sync");
        return Ok(());
    }

    let pool = sabzi_api::db::create_pool(&config.database_url).await?;
    let adapters = build_adapters(&config, pool.clone())?;

    tracing::info!(backend = ?config.backend, "Syncing products...");
    let created = ProductService::new(&pool, adapters.products.as_ref())
        .sync_from_external()
        .await?;

    tracing::info!(created, "Product sync complete!");
    Ok(())
}
