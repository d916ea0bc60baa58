//! In-memory `CatalogDao` for pipeline tests. No database involved.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::dao::CatalogDao;
use super::models::{AnalyticsRecord, ProductRecord, RankingSource};

#[derive(Default)]
pub(crate) struct MockCatalogDao {
    pub(crate) products: Vec<ProductRecord>,
    pub(crate) ranking_sources: Vec<RankingSource>,
    /// Product ids whose writes fail, to exercise partial-failure paths.
    pub(crate) failing_ids: HashSet<i64>,
    pub(crate) category_updates: Mutex<Vec<(i64, String)>>,
    pub(crate) score_upserts: Mutex<Vec<(i64, f64)>>,
    pub(crate) view_counts: Mutex<HashMap<i64, i64>>,
}

#[async_trait]
impl CatalogDao for MockCatalogDao {
    async fn fetch_products_page(&self, limit: i64, offset: i64) -> Result<Vec<ProductRecord>> {
        let offset = usize::try_from(offset.max(0)).unwrap_or(0);
        let limit = usize::try_from(limit.max(0)).unwrap_or(0);
        Ok(self
            .products
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_category(&self, product_id: i64, leaf: &str) -> Result<()> {
        if self.failing_ids.contains(&product_id) {
            return Err(anyhow!("simulated write failure for product {product_id}"));
        }
        self.category_updates
            .lock()
            .expect("mock lock")
            .push((product_id, leaf.to_string()));
        Ok(())
    }

    async fn fetch_ranking_sources(&self) -> Result<Vec<RankingSource>> {
        Ok(self.ranking_sources.clone())
    }

    async fn upsert_ranking_score(&self, product_id: i64, score: f64) -> Result<()> {
        if self.failing_ids.contains(&product_id) {
            return Err(anyhow!("simulated write failure for product {product_id}"));
        }
        self.score_upserts
            .lock()
            .expect("mock lock")
            .push((product_id, score));
        Ok(())
    }

    async fn increment_view(&self, product_id: i64) -> Result<AnalyticsRecord> {
        if self.failing_ids.contains(&product_id) {
            return Err(anyhow!("simulated write failure for product {product_id}"));
        }
        let mut counts = self.view_counts.lock().expect("mock lock");
        let views = counts.entry(product_id).or_insert(0);
        *views += 1;
        Ok(AnalyticsRecord {
            product_id,
            views_count: *views,
            sales_count: 0,
            last_sale_at: None,
            ranking_score: None,
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
