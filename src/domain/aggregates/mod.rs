//! Aggregates module
pub mod cart;
pub mod catalog;
pub mod order;
pub mod wishlist;

pub use cart::{Cart, CartLine, CouponOutcome};
pub use catalog::{Catalog, CatalogSource, Product};
pub use order::{CustomerInfo, Order, OrderLine};
pub use wishlist::Wishlist;
