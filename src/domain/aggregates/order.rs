//! Order assembly: immutable checkout snapshots, the WhatsApp handoff
//! message and the advisory customer-field checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::cart::Cart;
use crate::domain::events::Notice;
use crate::domain::pricing::Totals;
use crate::domain::value_objects::{Money, Slug};

/// Checkout contact fields. Validation is advisory only: violations become
/// notices and never block submission.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CustomerInfo {
    #[validate(length(min = 1, message = "Please enter your full name"))]
    pub name: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(custom = "validate_pincode")]
    pub pincode: String,
    pub city: String,
    #[validate(length(min = 1, message = "Please enter your complete address"))]
    pub address: String,
    pub notes: String,
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if (10..=12).contains(&digits) {
        return Ok(());
    }
    let mut err = ValidationError::new("phone");
    err.message = Some("Please enter a valid 10-digit phone number".into());
    Err(err)
}

fn validate_pincode(pincode: &str) -> Result<(), ValidationError> {
    if pincode.len() == 6 && pincode.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    let mut err = ValidationError::new("pincode");
    err.message = Some("Pincode must be exactly 6 digits".into());
    Err(err)
}

/// Collect the soft notices for a customer record. Callers surface these
/// and proceed regardless.
pub fn advisory_notices(customer: &CustomerInfo) -> Vec<Notice> {
    match customer.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .field_errors()
            .values()
            .flat_map(|field| field.iter())
            .map(|e| {
                Notice::error(
                    e.message
                        .as_ref()
                        .map_or_else(|| "Please check your details".to_string(), ToString::to_string),
                )
            })
            .collect(),
    }
}

/// A cart line frozen at submission time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLine {
    pub slug: Slug,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Immutable once created; appended to history, never edited.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub coupon_code: String,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
    pub customer: CustomerInfo,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Freeze the cart together with the totals computed at this moment.
    pub fn assemble(cart: &Cart, totals: &Totals, customer: CustomerInfo) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            coupon_code: cart.coupon().map(|c| c.code.clone()).unwrap_or_default(),
            subtotal: totals.subtotal,
            discount: totals.discount(),
            shipping: totals.shipping,
            total: totals.total,
            customer,
            lines: cart
                .lines()
                .iter()
                .map(|l| OrderLine {
                    slug: l.slug.clone(),
                    name: l.name.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect(),
        }
    }

    /// Human-readable summary for the chat handoff, per the fixed store
    /// template.
    pub fn summary(&self) -> String {
        let items = self
            .lines
            .iter()
            .map(|l| format!("• {} (×{}) - {}", l.name, l.quantity, l.unit_price.times(l.quantity)))
            .collect::<Vec<_>>()
            .join("\n");

        let mut message = format!(
            "🍪 *PiNa Bakes Order Request*\n\n*Items Ordered:*\n{items}\n\nSubtotal: {}",
            self.subtotal
        );
        if self.discount > Money::ZERO {
            if self.coupon_code.is_empty() {
                message.push_str(&format!("\nDiscount: -{}", self.discount));
            } else {
                message.push_str(&format!("\nDiscount ({}): -{}", self.coupon_code, self.discount));
            }
        }
        if self.shipping == Money::ZERO {
            message.push_str("\nShipping: Free");
        } else {
            message.push_str(&format!("\nShipping: {}", self.shipping));
        }
        message.push_str(&format!(
            "\n*Total Amount: {}*\n\n*Customer Details:*\n👤 Name: {}\n📱 Phone: {}\n📮 Pincode: {}\n🏙️ City: {}\n🏠 Address: {}\n📝 Notes: {}\n\nThank you for choosing PiNa Bakes! 🙏\n\nPlease confirm the order and let me know the delivery timeline.",
            self.total,
            self.customer.name,
            self.customer.phone,
            self.customer.pincode,
            not_specified(&self.customer.city, "Not specified"),
            self.customer.address,
            not_specified(&self.customer.notes, "None"),
        ));
        message
    }

    /// Deep link whose query carries the full order summary.
    pub fn chat_url(&self, whatsapp_number: &str) -> String {
        let base = format!("https://wa.me/{whatsapp_number}");
        Url::parse_with_params(&base, &[("text", self.summary())])
            .map_or(base, String::from)
    }
}

fn not_specified<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::domain::aggregates::catalog::Product;

    fn sample_cart() -> Cart {
        let mut cart = Cart::default();
        cart.add(
            &Product {
                slug: Slug::new("choco-chip"),
                name: "Choco Chip".to_string(),
                price: Money::new(250),
                tagline: String::new(),
                images: vec!["images/cc.webp".to_string()],
                bullets: vec![],
                ingredients: vec![],
                nutrition: None,
                tags: vec![],
            },
            2,
        );
        cart
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Asha".to_string(),
            phone: "98765 43210".to_string(),
            pincode: "110001".to_string(),
            city: String::new(),
            address: "12 Lane".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_advisory_notices_do_not_gate_assembly() {
        let bad = CustomerInfo { phone: "12".to_string(), pincode: "abc".to_string(), ..customer() };
        let notices = advisory_notices(&bad);
        assert_eq!(notices.len(), 2);

        let cart = sample_cart();
        let totals = cart.totals(&StoreConfig::default());
        let order = Order::assemble(&cart, &totals, bad);
        assert_eq!(order.lines.len(), 1);
    }

    #[test]
    fn test_valid_customer_has_no_notices() {
        assert!(advisory_notices(&customer()).is_empty());
    }

    #[test]
    fn test_summary_lines() {
        let mut cart = sample_cart();
        cart.apply_coupon("PINA10");
        let totals = cart.totals(&StoreConfig::default());
        let order = Order::assemble(&cart, &totals, customer());

        let summary = order.summary();
        assert!(summary.contains("• Choco Chip (×2) - ₹500"));
        assert!(summary.contains("Subtotal: ₹500"));
        assert!(summary.contains("Discount (PINA10): -₹50"));
        assert!(summary.contains("Shipping: ₹60"));
        assert!(summary.contains("*Total Amount: ₹510*"));
        assert!(summary.contains("🏙️ City: Not specified"));
        assert!(summary.contains("📝 Notes: None"));
    }

    #[test]
    fn test_summary_omits_zero_discount() {
        let cart = sample_cart();
        let totals = cart.totals(&StoreConfig::default());
        let order = Order::assemble(&cart, &totals, customer());
        assert!(!order.summary().contains("Discount"));
    }

    #[test]
    fn test_chat_url_encodes_summary() {
        let cart = sample_cart();
        let totals = cart.totals(&StoreConfig::default());
        let order = Order::assemble(&cart, &totals, customer());
        let url = order.chat_url("917678506669");
        assert!(url.starts_with("https://wa.me/917678506669?text="));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_orders_are_distinct() {
        let cart = sample_cart();
        let totals = cart.totals(&StoreConfig::default());
        let a = Order::assemble(&cart, &totals, customer());
        let b = Order::assemble(&cart, &totals, customer());
        assert_ne!(a.id, b.id);
    }
}
