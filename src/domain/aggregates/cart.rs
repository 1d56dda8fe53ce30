//! Cart aggregate: line items with add-time price snapshots plus the
//! applied coupon.

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::domain::aggregates::catalog::Product;
use crate::domain::pricing::{self, AppliedCoupon, Totals};
use crate::domain::value_objects::{Money, Slug};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartLine {
    pub slug: Slug,
    pub name: String,
    /// Captured when the line is created. Later catalog price changes do
    /// not reach lines already in the cart.
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// What `apply_coupon` did, for the caller's notice surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CouponOutcome {
    Applied(AppliedCoupon),
    Cleared,
    Unknown,
}

#[derive(Clone, Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    coupon: Option<AppliedCoupon>,
}

impl Cart {
    /// Restore from persisted lines. Zero-quantity or duplicate-slug lines
    /// should never have been written; drop rather than resurrect them.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::default();
        for line in lines {
            if line.quantity > 0 && !cart.lines.iter().any(|l| l.slug == line.slug) {
                cart.lines.push(line);
            }
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    pub fn set_coupon(&mut self, coupon: Option<AppliedCoupon>) {
        self.coupon = coupon;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines (the cart badge count).
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Merge into an existing line (snapshot untouched) or append a new
    /// one at the product's current price.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|l| l.slug == product.slug) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine {
                slug: product.slug.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
            });
        }
    }

    /// Absent slugs are a no-op, not an error.
    pub fn remove(&mut self, slug: &Slug) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.slug != slug);
        self.lines.len() != before
    }

    /// Zero removes the line; positive sets it exactly; unknown slugs are
    /// a no-op.
    pub fn set_quantity(&mut self, slug: &Slug, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(slug);
        }
        match self.lines.iter_mut().find(|l| &l.slug == slug) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Blank clears, unknown clears (stale coupons never survive a bad
    /// code), recognized codes apply case-insensitively.
    pub fn apply_coupon(&mut self, code: &str) -> CouponOutcome {
        let code = code.trim();
        if code.is_empty() {
            self.coupon = None;
            return CouponOutcome::Cleared;
        }
        match pricing::lookup_coupon(code) {
            Some(coupon) => {
                self.coupon = Some(coupon.clone());
                CouponOutcome::Applied(coupon)
            }
            None => {
                self.coupon = None;
                CouponOutcome::Unknown
            }
        }
    }

    pub fn totals(&self, config: &StoreConfig) -> Totals {
        pricing::totals(&self.lines, self.coupon.as_ref(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(slug: &str, price: i64) -> Product {
        Product {
            slug: Slug::new(slug),
            name: slug.to_string(),
            price: Money::new(price),
            tagline: String::new(),
            images: vec!["images/a.webp".to_string()],
            bullets: vec![],
            ingredients: vec![],
            nutrition: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_re_add_merges_into_one_line() {
        let mut cart = Cart::default();
        let p = product("choco-chip", 250);
        cart.add(&p, 1);
        cart.add(&p, 1);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_price_snapshot_survives_catalog_change() {
        let mut cart = Cart::default();
        let mut p = product("choco-chip", 100);
        cart.add(&p, 1);
        p.price = Money::new(200);
        cart.add(&p, 1);
        assert_eq!(cart.lines()[0].unit_price, Money::new(100));
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        cart.add(&product("a", 100), 2);
        assert!(cart.set_quantity(&Slug::new("a"), 0));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity(&Slug::new("a"), 3));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::default();
        assert!(!cart.remove(&Slug::new("ghost")));
    }

    #[test]
    fn test_invalid_coupon_clears_previous() {
        let mut cart = Cart::default();
        cart.add(&product("a", 100), 1);
        assert!(matches!(cart.apply_coupon("pina10"), CouponOutcome::Applied(_)));
        assert!(cart.coupon().is_some());
        assert_eq!(cart.apply_coupon("BADCODE"), CouponOutcome::Unknown);
        assert!(cart.coupon().is_none());
        let t = cart.totals(&StoreConfig::default());
        assert_eq!(t.coupon_discount, Money::ZERO);
    }

    #[test]
    fn test_blank_coupon_clears() {
        let mut cart = Cart::default();
        cart.apply_coupon("PINA10");
        assert_eq!(cart.apply_coupon("   "), CouponOutcome::Cleared);
        assert!(cart.coupon().is_none());
    }

    #[test]
    fn test_load_drops_zero_quantity_lines() {
        let lines = vec![
            CartLine {
                slug: Slug::new("a"),
                name: "a".to_string(),
                unit_price: Money::new(10),
                quantity: 0,
            },
            CartLine {
                slug: Slug::new("b"),
                name: "b".to_string(),
                unit_price: Money::new(10),
                quantity: 1,
            },
            CartLine {
                slug: Slug::new("b"),
                name: "b".to_string(),
                unit_price: Money::new(12),
                quantity: 4,
            },
        ];
        let cart = Cart::from_lines(lines);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].slug, Slug::new("b"));
        assert_eq!(cart.lines()[0].quantity, 1);
    }
}
