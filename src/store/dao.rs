//! Data access over the catalog store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{
    AnalyticsRecord, ProductRecord, RankingSource, RawAnalyticsRow, RawProductRow, RawRankingRow,
    ROOT_CATEGORY_ID,
};

/// Catalog persistence contract.
///
/// Every write is an independent, non-atomic operation relative to other
/// rows; the store is the sole arbiter of consistency.
#[async_trait]
pub trait CatalogDao: Send + Sync {
    /// Fetch one page of products ordered by id.
    ///
    /// # Errors
    /// Returns an error when the store cannot be queried.
    async fn fetch_products_page(&self, limit: i64, offset: i64) -> Result<Vec<ProductRecord>>;

    /// Assign a leaf category to one product and clear its review flag.
    ///
    /// # Errors
    /// Returns an error when the write fails.
    async fn update_category(&self, product_id: i64, leaf: &str) -> Result<()>;

    /// Fetch the whole catalog joined with analytics for ranking.
    ///
    /// # Errors
    /// Returns an error when the store cannot be queried.
    async fn fetch_ranking_sources(&self) -> Result<Vec<RankingSource>>;

    /// Upsert the ranking score for one product, leaving other analytics
    /// fields untouched.
    ///
    /// # Errors
    /// Returns an error when the write fails.
    async fn upsert_ranking_score(&self, product_id: i64, score: f64) -> Result<()>;

    /// Increment the view counter for one product, creating the analytics
    /// row on first view.
    ///
    /// # Errors
    /// Returns an error when the write fails.
    async fn increment_view(&self, product_id: i64) -> Result<AnalyticsRecord>;

    /// Cheap liveness probe against the store.
    ///
    /// # Errors
    /// Returns an error when the store is unreachable.
    async fn ping(&self) -> Result<()>;
}

/// Postgres-backed implementation.
pub struct PgCatalogDao {
    pool: PgPool,
}

impl PgCatalogDao {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogDao for PgCatalogDao {
    async fn fetch_products_page(&self, limit: i64, offset: i64) -> Result<Vec<ProductRecord>> {
        let rows: Vec<RawProductRow> = sqlx::query_as(
            r"
            SELECT
                id, name, name_ar, description, price, compare_at_price,
                category_ids, images, source_url, stock_count, rating,
                review_count, is_new, is_best_seller, is_featured
            FROM products
            ORDER BY id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch product page")?;

        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    async fn update_category(&self, product_id: i64, leaf: &str) -> Result<()> {
        sqlx::query(
            r"
            UPDATE products
            SET category_ids = $1, needs_review = FALSE
            WHERE id = $2
            ",
        )
        .bind(vec![ROOT_CATEGORY_ID.to_string(), leaf.to_string()])
        .bind(product_id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update category for product {product_id}"))?;

        Ok(())
    }

    async fn fetch_ranking_sources(&self) -> Result<Vec<RankingSource>> {
        let rows: Vec<RawRankingRow> = sqlx::query_as(
            r"
            SELECT
                p.id AS product_id,
                p.name,
                p.rating,
                a.views_count,
                a.sales_count,
                a.last_sale_at
            FROM products p
            LEFT JOIN product_analytics a ON a.product_id = p.id
            ORDER BY p.id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch ranking sources")?;

        Ok(rows.into_iter().map(RankingSource::from).collect())
    }

    async fn upsert_ranking_score(&self, product_id: i64, score: f64) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO product_analytics (product_id, ranking_score)
            VALUES ($1, $2)
            ON CONFLICT (product_id)
            DO UPDATE SET ranking_score = EXCLUDED.ranking_score
            ",
        )
        .bind(product_id)
        .bind(score)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to upsert ranking score for product {product_id}"))?;

        Ok(())
    }

    async fn increment_view(&self, product_id: i64) -> Result<AnalyticsRecord> {
        let row: RawAnalyticsRow = sqlx::query_as(
            r"
            INSERT INTO product_analytics (product_id, views_count)
            VALUES ($1, 1)
            ON CONFLICT (product_id)
            DO UPDATE SET views_count = product_analytics.views_count + 1
            RETURNING product_id, views_count, sales_count, last_sale_at, ranking_score
            ",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to increment views for product {product_id}"))?;

        Ok(AnalyticsRecord::from(row))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("store ping failed")?;
        Ok(())
    }
}
