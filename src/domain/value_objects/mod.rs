//! Value objects shared across the storefront domain.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// URL-safe product identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive a slug from a display name: lower-cased, non-alphanumerics
    /// stripped, whitespace and hyphen runs collapsed to a single hyphen.
    /// Falls back to the record's position when nothing survives.
    pub fn derive(name: &str, index: usize) -> Self {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;
        for c in name.trim().to_lowercase().chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c);
            } else if c.is_whitespace() || c == '-' {
                pending_hyphen = true;
            }
        }
        if out.is_empty() {
            Self(format!("item-{index}"))
        } else {
            Self(out)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole-rupee amount. Signed so that discount arithmetic can dip below
/// zero before the final clamp.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    pub const fn amount(&self) -> i64 {
        self.0
    }

    pub fn times(&self, quantity: u32) -> Money {
        Money(self.0 * i64::from(quantity))
    }

    /// Percentage of the amount, rounded half-up on whole units.
    pub fn percent(&self, pct: u32) -> Money {
        Money((self.0 * i64::from(pct) + 50).div_euclid(100))
    }

    pub fn clamped_to_zero(&self) -> Money {
        Money(self.0.max(0))
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    /// Indian digit grouping, no fraction digits: `₹1,23,456`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 2);
        let split = digits.len().saturating_sub(3);
        let (head, tail) = digits.split_at(split);
        let head_chars: Vec<char> = head.chars().collect();
        for (i, c) in head_chars.iter().enumerate() {
            grouped.push(*c);
            let remaining = head_chars.len() - i - 1;
            if remaining > 0 && remaining % 2 == 0 {
                grouped.push(',');
            }
        }
        if !head.is_empty() {
            grouped.push(',');
        }
        grouped.push_str(tail);
        if self.0 < 0 {
            write!(f, "-₹{grouped}")
        } else {
            write!(f, "₹{grouped}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_derive() {
        assert_eq!(Slug::derive("Choco Chip", 0).as_str(), "choco-chip");
        assert_eq!(Slug::derive("  Oats & Honey!  ", 1).as_str(), "oats-honey");
        assert_eq!(Slug::derive("Choco-Chip Deluxe", 2).as_str(), "choco-chip-deluxe");
        assert_eq!(Slug::derive("॥॥", 7).as_str(), "item-7");
    }

    #[test]
    fn test_money_percent_rounds_half_up() {
        assert_eq!(Money::new(55).percent(10), Money::new(6)); // 5.5 -> 6
        assert_eq!(Money::new(54).percent(10), Money::new(5)); // 5.4 -> 5
        assert_eq!(Money::new(500).percent(15), Money::new(75));
    }

    #[test]
    fn test_money_display_indian_grouping() {
        assert_eq!(Money::new(60).to_string(), "₹60");
        assert_eq!(Money::new(999).to_string(), "₹999");
        assert_eq!(Money::new(1000).to_string(), "₹1,000");
        assert_eq!(Money::new(1_234_567).to_string(), "₹12,34,567");
        assert_eq!(Money::new(-450).to_string(), "-₹450");
    }

    #[test]
    fn test_money_clamp() {
        assert_eq!(Money::new(-40).clamped_to_zero(), Money::ZERO);
        assert_eq!(Money::new(40).clamped_to_zero(), Money::new(40));
    }
}
