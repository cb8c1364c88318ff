//! Organic Sabzi Wala CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sabzi-cli migrate
//!
//! # Seed units, categories and the organic product range
//! sabzi-cli seed catalog
//!
//! # Seed the launch coupons
//! sabzi-cli seed coupons
//!
//! # Pull WooCommerce products into the local catalog
//! sabzi-cli sync products
//!
//! # Give a registered phone number warehouse access
//! sabzi-cli staff promote -p +919876543210 -r picker
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed reference data (catalog, coupons, delivery zones)
//! - `sync products` - Import products from the configured commerce backend
//! - `staff` - Manage staff roles

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use sabzi_core::UserRole;

mod commands;

#[derive(Parser)]
#[command(name = "sabzi-cli")]
#[command(author, version, about = "Organic Sabzi Wala CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Sync data from the commerce backend
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Units, categories and products
    Catalog,
    /// Launch coupons
    Coupons,
    /// Serviceable delivery zones
    Zones,
    /// Everything above
    All,
}

#[derive(Subcommand)]
enum SyncTarget {
    /// Import products into the local catalog
    Products,
}

#[derive(Subcommand)]
enum StaffAction {
    /// Assign a role to an existing account
    Promote {
        /// Phone number the account signed up with
        #[arg(short, long)]
        phone: String,

        /// Role (`picker`, `driver`, `manager`, `admin`, `customer`)
        #[arg(short, long, default_value = "picker")]
        role: String,
    },
    /// Grant staff and superuser flags to an existing account
    Superuser {
        /// Phone number the account signed up with
        #[arg(short, long)]
        phone: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => {
            let pool = commands::connect().await?;
            match target {
                SeedTarget::Catalog => commands::seed::catalog(&pool).await?,
                SeedTarget::Coupons => commands::seed::coupons(&pool).await?,
                SeedTarget::Zones => commands::seed::delivery_zones(&pool).await?,
                SeedTarget::All => {
                    commands::seed::catalog(&pool).await?;
                    commands::seed::coupons(&pool).await?;
                    commands::seed::delivery_zones(&pool).await?;
                }
            }
        }
        Commands::Sync { target } => match target {
            SyncTarget::Products => commands::sync::products().await?,
        },
        Commands::Staff { action } => {
            let pool = commands::connect().await?;
            match action {
                StaffAction::Promote { phone, role } => {
                    let role = parse_role(&role)?;
                    commands::staff::promote(&pool, &phone, role).await?;
                }
                StaffAction::Superuser { phone } => {
                    commands::staff::superuser(&pool, &phone).await?;
                }
            }
        }
    }
    Ok(())
}

fn parse_role(s: &str) -> Result<UserRole, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "customer" => Ok(UserRole::Customer),
        "picker" => Ok(UserRole::Picker),
        "driver" => Ok(UserRole::Driver),
        "manager" => Ok(UserRole::Manager),
        "admin" => Ok(UserRole::Admin),
        other => Err(format!("Unknown role '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("Picker"), Ok(UserRole::Picker));
        assert_eq!(parse_role(" manager "), Ok(UserRole::Manager));
        assert!(parse_role("owner").is_err());
    }
}
