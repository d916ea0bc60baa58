//! Typed catalog entities and the single raw-row mapping point.
//!
//! Rows arrive from the store loosely shaped: nullable fields, free-form
//! category strings, missing analytics. Every "is this present/valid" branch
//! lives here so the rest of the service works on typed records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::classify::{UNCATEGORIZED, rules::DEFAULT_RULES};

/// Fixed root of every category path; only the leaf is classifier-controlled.
pub const ROOT_CATEGORY_ID: &str = "kafh-almntjat";

/// Assumed margin used to synthesize a compare-at price when the source
/// carries none.
const COMPARE_AT_MARGIN: f64 = 0.75;

/// A catalog product, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub compare_at_price: f64,
    /// Always `[ROOT_CATEGORY_ID, leaf]`.
    pub category_path: [String; 2],
    pub image_urls: Vec<String>,
    pub source_url: Option<String>,
    pub stock_count: i32,
    pub rating: f64,
    pub review_count: i32,
    pub is_new: bool,
    pub is_best_seller: bool,
    pub is_featured: bool,
    /// True exactly when the leaf could not be confidently resolved.
    pub needs_review: bool,
}

impl ProductRecord {
    #[must_use]
    pub fn leaf_category(&self) -> &str {
        &self.category_path[1]
    }
}

/// Per-product analytics, zero-defaulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsRecord {
    pub product_id: i64,
    pub views_count: i64,
    pub sales_count: i64,
    pub last_sale_at: Option<DateTime<Utc>>,
    pub ranking_score: Option<f64>,
}

/// Product joined with its (possibly missing) analytics row, reduced to the
/// fields the ranking formula reads.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingSource {
    pub product_id: i64,
    pub name: String,
    pub rating: f64,
    pub views_count: i64,
    pub sales_count: i64,
    pub last_sale_at: Option<DateTime<Utc>>,
}

/// Product row as the store returns it.
#[derive(Debug, Clone, FromRow)]
pub struct RawProductRow {
    pub id: i64,
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub compare_at_price: Option<f64>,
    pub category_ids: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub source_url: Option<String>,
    pub stock_count: Option<i32>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub is_new: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Analytics row as the store returns it.
#[derive(Debug, Clone, FromRow)]
pub struct RawAnalyticsRow {
    pub product_id: i64,
    pub views_count: Option<i64>,
    pub sales_count: Option<i64>,
    pub last_sale_at: Option<DateTime<Utc>>,
    pub ranking_score: Option<f64>,
}

impl From<RawAnalyticsRow> for AnalyticsRecord {
    fn from(raw: RawAnalyticsRow) -> Self {
        Self {
            product_id: raw.product_id,
            views_count: raw.views_count.unwrap_or(0),
            sales_count: raw.sales_count.unwrap_or(0),
            last_sale_at: raw.last_sale_at,
            ranking_score: raw.ranking_score,
        }
    }
}

/// Joined ranking row as the store returns it.
#[derive(Debug, Clone, FromRow)]
pub struct RawRankingRow {
    pub product_id: i64,
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub views_count: Option<i64>,
    pub sales_count: Option<i64>,
    pub last_sale_at: Option<DateTime<Utc>>,
}

impl From<RawProductRow> for ProductRecord {
    fn from(raw: RawProductRow) -> Self {
        let price = raw.price.unwrap_or(0.0);
        let compare_at_price = raw
            .compare_at_price
            .unwrap_or_else(|| fallback_compare_at_price(price));
        let leaf = resolve_leaf(raw.category_ids.as_deref());
        let needs_review = leaf == UNCATEGORIZED;

        Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            name_ar: raw.name_ar,
            description: raw.description,
            price,
            compare_at_price,
            category_path: [ROOT_CATEGORY_ID.to_string(), leaf],
            image_urls: raw.images.unwrap_or_default(),
            source_url: raw.source_url,
            stock_count: raw.stock_count.unwrap_or(0),
            rating: raw.rating.unwrap_or(0.0),
            review_count: raw.review_count.unwrap_or(0),
            is_new: raw.is_new.unwrap_or(false),
            is_best_seller: raw.is_best_seller.unwrap_or(false),
            is_featured: raw.is_featured.unwrap_or(false),
            needs_review,
        }
    }
}

impl From<RawRankingRow> for RankingSource {
    fn from(raw: RawRankingRow) -> Self {
        Self {
            product_id: raw.product_id,
            name: raw.name.unwrap_or_default(),
            rating: raw.rating.unwrap_or(0.0),
            views_count: raw.views_count.unwrap_or(0),
            sales_count: raw.sales_count.unwrap_or(0),
            last_sale_at: raw.last_sale_at,
        }
    }
}

/// Pick the leaf out of a stored category path.
///
/// The root marker is skipped; anything not in the known leaf set maps to
/// the uncategorized sentinel, which in turn flags the product for review.
fn resolve_leaf(category_ids: Option<&[String]>) -> String {
    category_ids
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|id| is_known_leaf(id))
        .unwrap_or(UNCATEGORIZED)
        .to_string()
}

/// Whether `id` is a known leaf category.
#[must_use]
pub fn is_known_leaf(id: &str) -> bool {
    DEFAULT_RULES.iter().any(|rule| rule.id == id)
}

/// Marketing fallback: reconstruct a compare-at price from the display price
/// and the assumed margin.
#[must_use]
pub fn fallback_compare_at_price(price: f64) -> f64 {
    (price / COMPARE_AT_MARGIN).round()
}
