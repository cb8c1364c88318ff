//! Domain models.
//!
//! Row types derive `sqlx::FromRow` and map one-to-one onto the tables in
//! `crates/api/migrations/`. Types that reach clients derive `Serialize`
//! directly unless the response shape differs from the row.

pub mod address;
pub mod catalog;
pub mod coupon;
pub mod delivery;
pub mod order;
pub mod subscription;
pub mod user;
pub mod wishlist;

pub use address::{Address, AddressInput, AddressPatch};
pub use catalog::{Category, Product, ProductListing, UnitOfMeasure};
pub use coupon::Coupon;
pub use delivery::DeliveryZone;
pub use order::{DriverInfo, NewOrder, NewOrderItem, Order, OrderItemDetail, OrderView};
pub use subscription::{Subscription, SubscriptionView};
pub use user::{User, UserProfile};
pub use wishlist::{WishlistEntry, WishlistView};
