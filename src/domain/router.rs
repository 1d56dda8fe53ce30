//! Hash-fragment routing: exactly one visible view, derived purely from
//! the URL fragment.
//!
//! Programmatic navigation and host-driven changes (back/forward, manual
//! edits) funnel through the same transition, so there is no second
//! rendering path to drift.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

use crate::domain::value_objects::Slug;

const PRODUCT_PREFIX: &str = "/product/";

/// Characters escaped when building a product fragment.
const FRAGMENT_ESCAPES: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`').add(b'#');

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "target", rename_all = "snake_case")]
pub enum RouteState {
    #[default]
    Home,
    Section(String),
    ProductDetail(Slug),
}

/// Decode a fragment into the single view it selects.
pub fn resolve(fragment: &str) -> RouteState {
    let frag = fragment.strip_prefix('#').unwrap_or(fragment);
    if let Some(rest) = frag.strip_prefix(PRODUCT_PREFIX) {
        let slug = percent_decode_str(rest).decode_utf8_lossy().into_owned();
        return RouteState::ProductDetail(Slug::new(slug));
    }
    match frag {
        "" | "home" => RouteState::Home,
        section => RouteState::Section(section.to_string()),
    }
}

/// Canonical fragment for a caller-supplied target: a bare section id, a
/// `/product/…` path, or an already-prefixed fragment all normalize to the
/// same `#…` form.
pub fn normalize(target: &str) -> String {
    let t = target.trim();
    let t = t.strip_prefix('#').unwrap_or(t);
    if t.is_empty() {
        "#home".to_string()
    } else {
        format!("#{t}")
    }
}

/// Fragment that routes to a product's detail view.
pub fn product_fragment(slug: &Slug) -> String {
    format!(
        "#{PRODUCT_PREFIX}{}",
        utf8_percent_encode(slug.as_str(), FRAGMENT_ESCAPES)
    )
}

/// Owns one piece of truth: the current view.
#[derive(Debug)]
pub struct Router {
    fragment: String,
    current: RouteState,
}

impl Router {
    pub fn new() -> Self {
        Self { fragment: "#home".to_string(), current: RouteState::Home }
    }

    pub fn current(&self) -> &RouteState {
        &self.current
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Re-derive the view from a fragment. Returns the new state only when
    /// it actually changed, so re-entering the same fragment is free of
    /// duplicate side effects.
    pub fn sync(&mut self, fragment: &str) -> Option<RouteState> {
        let fragment = normalize(fragment);
        let next = resolve(&fragment);
        self.fragment = fragment;
        if next == self.current {
            None
        } else {
            self.current = next.clone();
            Some(next)
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_patterns() {
        assert_eq!(resolve("#home"), RouteState::Home);
        assert_eq!(resolve(""), RouteState::Home);
        assert_eq!(resolve("#products"), RouteState::Section("products".into()));
        assert_eq!(
            resolve("#/product/choco-chip"),
            RouteState::ProductDetail(Slug::new("choco-chip"))
        );
        assert_eq!(
            resolve("#/product/oats%20honey"),
            RouteState::ProductDetail(Slug::new("oats honey"))
        );
    }

    #[test]
    fn test_normalize_forms() {
        assert_eq!(normalize("products"), "#products");
        assert_eq!(normalize("#products"), "#products");
        assert_eq!(normalize("/product/choco-chip"), "#/product/choco-chip");
        assert_eq!(normalize(""), "#home");
    }

    #[test]
    fn test_product_fragment_round_trips() {
        let slug = Slug::new("choco-chip");
        assert_eq!(
            resolve(&product_fragment(&slug)),
            RouteState::ProductDetail(slug)
        );
    }

    #[test]
    fn test_sync_is_idempotent() {
        let mut router = Router::new();
        assert!(router.sync("#products").is_some());
        assert!(router.sync("#products").is_none());
        assert_eq!(router.current(), &RouteState::Section("products".into()));
    }

    #[test]
    fn test_round_trip_back_to_section() {
        let mut router = Router::new();
        router.sync("#products");
        router.sync("#/product/choco-chip");
        assert!(matches!(router.current(), RouteState::ProductDetail(_)));
        let back = router.sync("#products");
        assert_eq!(back, Some(RouteState::Section("products".into())));
        assert!(!matches!(router.current(), RouteState::ProductDetail(_)));
    }
}
