//! Pure pricing: subtotal, per-line bulk tiers, coupon percentage and
//! conditional shipping.
//!
//! The order of operations is load-bearing: subtotal → combined discount →
//! clamp once → shipping off the clamped amount → total. Re-ordering
//! changes observable totals.

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::domain::aggregates::cart::CartLine;
use crate::domain::value_objects::Money;

/// Static coupon table. Codes are stored uppercase and matched
/// case-insensitively.
pub const COUPONS: &[(&str, u32)] = &[("PINA10", 10), ("FESTIVE20", 20)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    Percent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub kind: CouponKind,
    pub value: u32,
}

pub fn lookup_coupon(code: &str) -> Option<AppliedCoupon> {
    let wanted = code.trim().to_uppercase();
    COUPONS.iter().find(|(c, _)| *c == wanted).map(|(c, v)| AppliedCoupon {
        code: (*c).to_string(),
        kind: CouponKind::Percent,
        value: *v,
    })
}

/// Everything the view layer needs to render the cart footer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Money,
    pub coupon_discount: Money,
    pub bulk_discount: Money,
    pub shipping: Money,
    pub total: Money,
}

impl Totals {
    pub fn discount(&self) -> Money {
        self.coupon_discount + self.bulk_discount
    }
}

pub fn subtotal(lines: &[CartLine]) -> Money {
    lines
        .iter()
        .fold(Money::ZERO, |acc, line| acc + line.line_total())
}

/// Line-level bulk tier: 5+ units earn 15%, 3+ earn 10%.
pub fn bulk_rate_percent(quantity: u32) -> u32 {
    if quantity >= 5 {
        15
    } else if quantity >= 3 {
        10
    } else {
        0
    }
}

/// Summed per line, each on that line's own total.
pub fn bulk_discount(lines: &[CartLine]) -> Money {
    lines.iter().fold(Money::ZERO, |acc, line| {
        acc + line.line_total().percent(bulk_rate_percent(line.quantity))
    })
}

pub fn coupon_discount(subtotal: Money, coupon: Option<&AppliedCoupon>) -> Money {
    match coupon {
        Some(c) if c.kind == CouponKind::Percent => subtotal.percent(c.value),
        _ => Money::ZERO,
    }
}

/// Free above the threshold, free for an empty cart, flat charge otherwise.
/// `after_discount` is the already-clamped amount, not the raw subtotal.
pub fn shipping(after_discount: Money, cart_is_empty: bool, config: &StoreConfig) -> Money {
    if cart_is_empty || after_discount >= config.free_shipping_threshold {
        Money::ZERO
    } else {
        config.shipping_charge
    }
}

pub fn totals(
    lines: &[CartLine],
    coupon: Option<&AppliedCoupon>,
    config: &StoreConfig,
) -> Totals {
    let subtotal = subtotal(lines);
    let coupon_discount = coupon_discount(subtotal, coupon);
    let bulk_discount = bulk_discount(lines);
    // The discounts are summed without capping against the subtotal; the
    // clamp happens exactly once, here.
    let after = (subtotal - coupon_discount - bulk_discount).clamped_to_zero();
    let shipping = shipping(after, lines.is_empty(), config);
    Totals {
        subtotal,
        coupon_discount,
        bulk_discount,
        shipping,
        total: after + shipping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Slug;

    fn line(slug: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            slug: Slug::new(slug),
            name: slug.to_string(),
            unit_price: Money::new(price),
            quantity,
        }
    }

    #[test]
    fn test_bulk_tiers() {
        assert_eq!(bulk_rate_percent(1), 0);
        assert_eq!(bulk_rate_percent(2), 0);
        assert_eq!(bulk_rate_percent(3), 10);
        assert_eq!(bulk_rate_percent(4), 10);
        assert_eq!(bulk_rate_percent(5), 15);
        assert_eq!(bulk_rate_percent(12), 15);
        // line price 100, quantity 5 -> round(500 * 0.15) = 75
        assert_eq!(bulk_discount(&[line("a", 100, 5)]), Money::new(75));
        assert_eq!(bulk_discount(&[line("a", 100, 2)]), Money::ZERO);
    }

    #[test]
    fn test_coupon_lookup_is_case_insensitive() {
        assert_eq!(lookup_coupon("pina10").map(|c| c.value), Some(10));
        assert_eq!(lookup_coupon(" PINA10 ").map(|c| c.value), Some(10));
        assert!(lookup_coupon("BADCODE").is_none());
    }

    #[test]
    fn test_discount_ordering_invariant() {
        let config = StoreConfig::default();
        let lines = vec![line("a", 450, 3), line("b", 250, 1)];
        let coupon = lookup_coupon("PINA10");
        let t = totals(&lines, coupon.as_ref(), &config);
        let after = (t.subtotal - t.discount()).clamped_to_zero();
        assert_eq!(t.total, after + t.shipping);
        // shipping is computed off the discounted amount, not the subtotal
        assert_eq!(t.shipping, shipping(after, false, &config));
    }

    #[test]
    fn test_shipping_applies_to_discounted_amount() {
        let config = StoreConfig::default();
        // subtotal 1050 crosses the threshold, but 10% off drops it to 945
        let lines = vec![line("a", 1050, 1)];
        let t = totals(&lines, lookup_coupon("PINA10").as_ref(), &config);
        assert_eq!(t.subtotal, Money::new(1050));
        assert_eq!(t.coupon_discount, Money::new(105));
        assert_eq!(t.shipping, Money::new(60));
        assert_eq!(t.total, Money::new(1005));
    }

    #[test]
    fn test_free_shipping_boundary() {
        let config = StoreConfig::default();
        assert_eq!(shipping(Money::new(999), false, &config), Money::ZERO);
        assert_eq!(shipping(Money::new(998), false, &config), Money::new(60));
        assert_eq!(shipping(Money::ZERO, true, &config), Money::ZERO);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let t = totals(&[], None, &StoreConfig::default());
        assert_eq!(t, Totals::default());
    }

    #[test]
    fn test_total_clamped_after_summing_discounts() {
        let config = StoreConfig::default();
        // an oversized coupon pushes the nominal discount past the
        // subtotal; the clamped amount floors at zero and shipping is
        // charged on that floor
        let coupon = AppliedCoupon {
            code: "COMP".to_string(),
            kind: CouponKind::Percent,
            value: 150,
        };
        let lines = vec![line("a", 100, 1)];
        let t = totals(&lines, Some(&coupon), &config);
        assert!(t.discount() > t.subtotal);
        assert_eq!(t.total, config.shipping_charge);
    }
}
