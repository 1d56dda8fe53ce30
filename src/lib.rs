//! PiNa Bakes Storefront Core
//!
//! The state and pricing engine behind the PiNa Bakes shop.
//!
//! ## Features
//! - Product catalog cache with normalized records and slug lookups
//! - Shopping cart and wishlist with derived pricing (coupons, bulk tiers,
//!   conditional shipping)
//! - Hash-fragment router with idempotent view transitions
//! - Durable key-value persistence, best-effort by contract
//! - WhatsApp order handoff and fire-and-forget webhook notifications

use thiserror::Error;

pub mod app;
pub mod config;
pub mod domain;
pub mod notify;
pub mod storage;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that reach the user. Persistence and notification failures are
/// logged at their boundaries and never surface here.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The catalog could not be fetched or parsed. Retryable; nothing is
    /// cached on this path.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// Checkout was attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub use app::{CheckoutReceipt, Intent, Storefront};
pub use config::StoreConfig;
pub use domain::events::{Notice, NoticeLevel, StoreEvent};
