//! Product catalog: one bulk load per session, normalized records, slug
//! lookups.
//!
//! Raw records arrive in whatever shape the export produced; everything is
//! coerced into the canonical [`Product`] in one place so no two callers
//! normalize differently.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::value_objects::{Money, Slug};
use crate::{Result, StoreError};

/// Shown when a record carries no usable image reference.
const PLACEHOLDER_IMAGE: &str = "images/placeholder.webp";

/// Price at or above which a product is badged as premium.
const PREMIUM_FROM: i64 = 300;

#[derive(Clone, Debug, Serialize)]
pub struct Product {
    pub slug: Slug,
    pub name: String,
    pub price: Money,
    pub tagline: String,
    /// Ordered, never empty; the first entry is the cover.
    pub images: Vec<String>,
    pub bullets: Vec<String>,
    pub ingredients: Vec<String>,
    pub nutrition: Option<NutritionFacts>,
    pub tags: Vec<String>,
}

impl Product {
    pub fn cover_image(&self) -> &str {
        self.images.first().map_or(PLACEHOLDER_IMAGE, String::as_str)
    }

    pub fn is_premium(&self) -> bool {
        self.price.amount() >= PREMIUM_FROM
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionFacts {
    pub energy: String,
    pub protein: String,
    pub fat: String,
    pub carbs: String,
    pub sugar: String,
    pub fibre: String,
    pub sodium: String,
}

// =============================================================================
// Raw record normalization
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCatalog {
    Bare(Vec<RawProduct>),
    Wrapped { products: Vec<RawProduct> },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawProduct {
    name: String,
    price: Option<i64>,
    tagline: String,
    slug: Option<String>,
    img: Option<String>,
    image: Option<String>,
    images: Vec<String>,
    bullets: Vec<String>,
    ingredients: Vec<String>,
    nutrition: Option<NutritionFacts>,
    tags: Vec<String>,
}

/// Collapse the image field variants observed across catalog exports into
/// one ordered list.
fn normalize_images(raw: &RawProduct) -> Vec<String> {
    if !raw.images.is_empty() {
        return raw.images.clone();
    }
    if let Some(single) = raw.image.clone().or_else(|| raw.img.clone()) {
        return vec![single];
    }
    vec![PLACEHOLDER_IMAGE.to_string()]
}

fn normalize(records: Vec<RawProduct>) -> Vec<Product> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let base = match raw.slug.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => Slug::new(s),
                _ => Slug::derive(&raw.name, index),
            };
            let slug = if seen.insert(base.as_str().to_string()) {
                base
            } else {
                let fallback = Slug::new(format!("{}-{index}", base.as_str()));
                seen.insert(fallback.as_str().to_string());
                fallback
            };
            let images = normalize_images(&raw);
            Product {
                slug,
                name: raw.name,
                price: Money::new(raw.price.unwrap_or(0)),
                tagline: raw.tagline,
                images,
                bullets: raw.bullets,
                ingredients: raw.ingredients,
                nutrition: raw.nutrition,
                tags: raw.tags,
            }
        })
        .collect()
}

/// Accepts a bare array or a `{ "products": [...] }` wrapper; an empty or
/// malformed body is `CatalogUnavailable`, never an empty cache.
pub fn parse_catalog(body: &str) -> Result<Vec<Product>> {
    let raw: RawCatalog =
        serde_json::from_str(body).map_err(|e| StoreError::CatalogUnavailable(e.to_string()))?;
    let records = match raw {
        RawCatalog::Bare(records) => records,
        RawCatalog::Wrapped { products } => products,
    };
    if records.is_empty() {
        return Err(StoreError::CatalogUnavailable("catalog is empty".to_string()));
    }
    Ok(normalize(records))
}

// =============================================================================
// Catalog cache
// =============================================================================

#[derive(Clone, Debug)]
pub enum CatalogSource {
    File(PathBuf),
    Http(String),
    /// A literal JSON body, for tests and seeded demos.
    Inline(String),
}

impl CatalogSource {
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Http(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    async fn fetch(&self) -> Result<String> {
        match self {
            Self::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                StoreError::CatalogUnavailable(format!("{}: {e}", path.display()))
            }),
            Self::Http(url) => {
                let response = reqwest::get(url)
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| StoreError::CatalogUnavailable(e.to_string()))?;
                response
                    .text()
                    .await
                    .map_err(|e| StoreError::CatalogUnavailable(e.to_string()))
            }
            Self::Inline(body) => Ok(body.clone()),
        }
    }
}

/// Loads once, shares the list for the session, answers slug lookups.
pub struct Catalog {
    source: CatalogSource,
    // the lock is held across the fetch so concurrent first loads share a
    // single in-flight request
    cache: Mutex<Option<Arc<Vec<Product>>>>,
}

impl Catalog {
    pub fn new(source: CatalogSource) -> Self {
        Self { source, cache: Mutex::new(None) }
    }

    /// Idempotent after the first success. Failures cache nothing, so a
    /// later retry can still succeed.
    pub async fn load(&self) -> Result<Arc<Vec<Product>>> {
        let mut slot = self.cache.lock().await;
        if let Some(list) = slot.as_ref() {
            return Ok(Arc::clone(list));
        }
        let body = self.source.fetch().await?;
        let list = Arc::new(parse_catalog(&body)?);
        *slot = Some(Arc::clone(&list));
        tracing::info!(products = list.len(), "catalog loaded");
        Ok(list)
    }

    /// Drop the cached list; the next `load` fetches again.
    pub async fn invalidate(&self) {
        self.cache.lock().await.take();
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Product> {
        let list = self.load().await?;
        list.iter()
            .find(|p| p.slug.as_str() == slug)
            .cloned()
            .ok_or_else(|| StoreError::ProductNotFound(slug.to_string()))
    }
}
