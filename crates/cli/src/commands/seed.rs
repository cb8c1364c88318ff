//! Seed the database with reference data.
//!
//! Every seeder is idempotent: units, categories and products are upserted by
//! symbol or slug, coupons and zones that already exist are left alone.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use sabzi_api::db::{CatalogRepository, CouponRepository, DeliveryZoneRepository, ProductUpsert};
use sabzi_core::UnitId;

use super::CommandError;

const UNITS: &[(&str, &str)] = &[("Kilogram", "kg"), ("Piece", "pc"), ("Gram", "g")];

const CATEGORIES: &[(&str, &str, &str)] = &[
    (
        "Organic Vegetables",
        "organic-vegetables",
        "https://cdn-icons-png.flaticon.com/512/2329/2329903.png",
    ),
    (
        "Organic Fruits",
        "organic-fruits",
        "https://cdn-icons-png.flaticon.com/512/1625/1625048.png",
    ),
    (
        "Organic Staples",
        "organic-staples",
        "https://cdn-icons-png.flaticon.com/512/766/766023.png",
    ),
];

struct SeedProduct {
    name: &'static str,
    category: &'static str,
    price: u32,
    unit: &'static str,
    weight: u32,
}

const fn product(
    name: &'static str,
    category: &'static str,
    price: u32,
    unit: &'static str,
    weight: u32,
) -> SeedProduct {
    SeedProduct {
        name,
        category,
        price,
        unit,
        weight,
    }
}

const PRODUCTS: &[SeedProduct] = &[
    product("Organic Onion", "organic-vegetables", 50, "kg", 1),
    product("Organic Bio Potato", "organic-vegetables", 40, "kg", 1),
    product("Desi Tomato", "organic-vegetables", 35, "kg", 1),
    product("Organic Ginger", "organic-vegetables", 30, "g", 200),
    product("Organic Garlic", "organic-vegetables", 60, "g", 250),
    product("Fresh Spinach (Palak)", "organic-vegetables", 25, "pc", 1),
    product("Organic Lemon", "organic-vegetables", 10, "pc", 1),
    product("Cucumber (Desi)", "organic-vegetables", 30, "kg", 1),
    product("Organic Carrot", "organic-vegetables", 70, "kg", 1),
    product("Beetroot", "organic-vegetables", 40, "kg", 1),
    product("Organic Banana", "organic-fruits", 60, "kg", 1),
    product("Kashmir Apple", "organic-fruits", 220, "kg", 1),
    product("Organic Pomegranate", "organic-fruits", 150, "kg", 1),
    product("Sweet Papaya", "organic-fruits", 60, "pc", 1),
    product("Organic Brown Rice", "organic-staples", 120, "kg", 1),
    product("Whole Wheat Atta", "organic-staples", 60, "kg", 1),
    product("Organic Tur Dal", "organic-staples", 180, "kg", 1),
];

/// (code, discount, minimum order value, days valid)
const COUPONS: &[(&str, u32, u32, i64)] = &[
    ("WELCOME50", 50, 150, 30),
    ("ORGANIC20", 20, 100, 7),
    ("SAVE100", 100, 500, 30),
];

/// (zip code, city, delivery hours)
const DELIVERY_ZONES: &[(&str, &str, i32)] = &[("226001", "Lucknow", 6), ("208001", "Kanpur", 24)];

/// Lowercase, dash-separated slug with punctuation dropped.
fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn lookup<T: Copy>(pairs: &[(&str, T)], key: &str) -> Result<T, CommandError> {
    pairs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .ok_or_else(|| CommandError::InvalidInput(format!("unknown seed reference '{key}'")))
}

/// Seed units, categories and the organic product range.
///
/// # Errors
///
/// Returns an error if any upsert fails.
pub async fn catalog(pool: &PgPool) -> Result<(), CommandError> {
    let repo = CatalogRepository::new(pool);

    let mut units: Vec<(&str, UnitId)> = Vec::with_capacity(UNITS.len());
    for (name, symbol) in UNITS {
        let unit = repo.upsert_unit(name, symbol).await?;
        units.push((*symbol, unit.id));
    }
    info!(count = units.len(), "Units seeded");

    let mut categories = Vec::with_capacity(CATEGORIES.len());
    for (name, slug, image) in CATEGORIES {
        let category = repo.upsert_category(name, slug, Some(*image)).await?;
        info!(slug = %category.slug, "Category seeded");
        categories.push((*slug, category.id));
    }

    for seed in PRODUCTS {
        let unit_id = lookup(&units, seed.unit)?;
        let row = repo
            .upsert_product(&ProductUpsert {
                category_id: Some(lookup(&categories, seed.category)?),
                name: seed.name.to_string(),
                slug: slugify(seed.name),
                description: String::new(),
                image: None,
                base_price: Decimal::from(seed.price),
                discounted_price: None,
                pricing_unit_id: unit_id,
                weight_value: Decimal::from(seed.weight),
                weight_unit_id: unit_id,
                is_organic: true,
            })
            .await?;
        info!(slug = %row.slug, "Product seeded");
    }

    info!(count = PRODUCTS.len(), "Catalog seed complete!");
    Ok(())
}

/// Seed the launch coupons. Existing codes are skipped.
///
/// # Errors
///
/// Returns an error if an insert fails.
pub async fn coupons(pool: &PgPool) -> Result<(), CommandError> {
    let repo = CouponRepository::new(pool);
    let now = Utc::now();

    for (code, discount, min_order, days) in COUPONS {
        let created = repo
            .create_if_missing(
                code,
                Decimal::from(*discount),
                Decimal::from(*min_order),
                Some(now + Duration::days(*days)),
            )
            .await?;
        match created {
            Some(_) => info!(code, "Coupon created"),
            None => info!(code, "Coupon already exists, skipped"),
        }
    }
    Ok(())
}

/// Seed the serviceable delivery zones.
///
/// # Errors
///
/// Returns an error if an upsert fails.
pub async fn delivery_zones(pool: &PgPool) -> Result<(), CommandError> {
    let repo = DeliveryZoneRepository::new(pool);
    for (zip_code, city, hours) in DELIVERY_ZONES {
        let zone = repo.upsert(zip_code, city, *hours).await?;
        info!(zip_code = %zone.zip_code, city = %zone.city, "Delivery zone seeded");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_drops_punctuation() {
        assert_eq!(slugify("Organic Onion"), "organic-onion");
        assert_eq!(slugify("Fresh Spinach (Palak)"), "fresh-spinach-palak");
        assert_eq!(slugify("  Cucumber   (Desi) "), "cucumber-desi");
    }

    #[test]
    fn test_seed_products_reference_known_units_and_categories() {
        for seed in PRODUCTS {
            assert!(UNITS.iter().any(|(_, symbol)| *symbol == seed.unit), "{}", seed.name);
            assert!(
                CATEGORIES.iter().any(|(_, slug, _)| *slug == seed.category),
                "{}",
                seed.name
            );
        }
    }

    #[test]
    fn test_seed_slugs_are_unique() {
        let mut slugs: Vec<String> = PRODUCTS.iter().map(|p| slugify(p.name)).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), PRODUCTS.len());
    }

    #[test]
    fn test_lookup() {
        let pairs = [("kg", 1), ("g", 2)];
        assert_eq!(lookup(&pairs, "g").unwrap(), 2);
        assert!(lookup(&pairs, "lb").is_err());
    }
}
