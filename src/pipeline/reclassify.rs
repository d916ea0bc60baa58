//! Paged reclassification over the catalog.
//!
//! Each run loads one page of products, classifies every product with the
//! keyword matcher (and vision fallback when configured), and persists only
//! confident assignments. Per-product failures are logged and skipped so a
//! bad row never aborts the page.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{ClassifyInput, Classifier, UNCATEGORIZED};
use crate::classify::normalize::normalize_description;
use crate::observability::metrics::Metrics;
use crate::store::{CatalogDao, ProductRecord};

/// Outcome of one reclassification page.
///
/// `processed == 0` is the end-of-catalog signal callers paginate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReclassifyPage {
    pub processed: usize,
    pub updated: usize,
    pub next_offset: i64,
}

pub struct ReclassifyStage {
    classifier: Arc<Classifier>,
    dao: Arc<dyn CatalogDao>,
    max_concurrency: NonZeroUsize,
    metrics: Arc<Metrics>,
}

impl ReclassifyStage {
    #[must_use]
    pub fn new(
        classifier: Arc<Classifier>,
        dao: Arc<dyn CatalogDao>,
        max_concurrency: NonZeroUsize,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            classifier,
            dao,
            max_concurrency,
            metrics,
        }
    }

    /// Classify one page of products and persist confident assignments.
    ///
    /// # Errors
    /// Returns an error only when the page itself cannot be fetched;
    /// per-product classification or write failures are logged and skipped.
    pub async fn run_page(&self, limit: i64, offset: i64) -> Result<ReclassifyPage> {
        let started = Instant::now();
        let products = self.dao.fetch_products_page(limit, offset).await?;
        let processed = products.len();

        let updated = futures::stream::iter(products)
            .map(|product| self.reclassify_one(product))
            .buffer_unordered(self.max_concurrency.get())
            .filter(|persisted| std::future::ready(*persisted))
            .count()
            .await;

        self.metrics.reclassify_pages_total.inc();
        self.metrics
            .reclassify_page_duration_seconds
            .observe(started.elapsed().as_secs_f64());

        let page = ReclassifyPage {
            processed,
            updated,
            next_offset: offset + i64::try_from(processed).unwrap_or(0),
        };
        info!(
            offset,
            processed = page.processed,
            updated = page.updated,
            "reclassification page complete"
        );
        Ok(page)
    }

    /// Classify a single product; returns whether an assignment was persisted.
    async fn reclassify_one(&self, product: ProductRecord) -> bool {
        let input = classify_input(&product);
        let result = self.classifier.classify_with_vision(&input).await;
        self.metrics.classifications_total.inc();

        if result.category_id == UNCATEGORIZED || result.confidence <= 0.0 {
            return false;
        }

        match self.dao.update_category(product.id, &result.category_id).await {
            Ok(()) => {
                self.metrics.products_reclassified_total.inc();
                true
            }
            Err(error) => {
                warn!(
                    product_id = product.id,
                    category = %result.category_id,
                    error = %error,
                    "failed to persist category assignment"
                );
                false
            }
        }
    }
}

fn classify_input(product: &ProductRecord) -> ClassifyInput {
    ClassifyInput {
        name: product.name.clone(),
        name_ar: product.name_ar.clone(),
        description: product.description.as_deref().map(normalize_description),
        breadcrumbs: Vec::new(),
        url: product.source_url.clone(),
        image_urls: product.image_urls.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::classify::rules::default_matcher;
    use crate::store::ROOT_CATEGORY_ID;
    use crate::store::mock::MockCatalogDao;

    fn product(id: i64, name: &str) -> ProductRecord {
        ProductRecord {
            id,
            name: name.to_string(),
            name_ar: None,
            description: None,
            price: 100.0,
            compare_at_price: 134.0,
            category_path: [ROOT_CATEGORY_ID.to_string(), UNCATEGORIZED.to_string()],
            image_urls: Vec::new(),
            source_url: None,
            stock_count: 1,
            rating: 0.0,
            review_count: 0,
            is_new: false,
            is_best_seller: false,
            is_featured: false,
            needs_review: true,
        }
    }

    fn stage(dao: Arc<MockCatalogDao>) -> ReclassifyStage {
        let classifier = Arc::new(Classifier::new(default_matcher(), None));
        let metrics = Arc::new(
            Metrics::new(&prometheus::Registry::new()).expect("metrics register"),
        );
        ReclassifyStage::new(
            classifier,
            dao,
            NonZeroUsize::new(4).expect("non-zero"),
            metrics,
        )
    }

    #[tokio::test]
    async fn persists_only_confident_assignments() {
        let dao = Arc::new(MockCatalogDao {
            products: vec![
                product(1, "Baby stroller with carrycot"),
                product(2, "Silicone feeding bottle set"),
                product(3, "zzzz qqqq"),
                product(4, "xxxx yyyy"),
            ],
            ..MockCatalogDao::default()
        });
        let page = stage(Arc::clone(&dao))
            .run_page(50, 0)
            .await
            .expect("page runs");

        assert_eq!(page.processed, 4);
        assert_eq!(page.updated, 2);
        assert_eq!(page.next_offset, 4);

        let updates = dao.category_updates.lock().expect("mock lock");
        let ids: HashSet<i64> = updates.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, HashSet::from([1, 2]));
        assert!(
            updates
                .iter()
                .any(|(id, leaf)| *id == 1 && leaf == "strollers-gear")
        );
    }

    #[tokio::test]
    async fn write_failure_skips_the_product_but_not_the_page() {
        let dao = Arc::new(MockCatalogDao {
            products: vec![
                product(1, "Baby stroller with carrycot"),
                product(2, "Silicone feeding bottle set"),
            ],
            failing_ids: HashSet::from([1]),
            ..MockCatalogDao::default()
        });
        let page = stage(Arc::clone(&dao))
            .run_page(50, 0)
            .await
            .expect("page runs");

        assert_eq!(page.processed, 2);
        assert_eq!(page.updated, 1);
        assert_eq!(
            *dao.category_updates.lock().expect("mock lock"),
            vec![(2, "feeding".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_page_signals_end_of_catalog() {
        let dao = Arc::new(MockCatalogDao::default());
        let page = stage(dao).run_page(50, 120).await.expect("page runs");
        assert_eq!(
            page,
            ReclassifyPage {
                processed: 0,
                updated: 0,
                next_offset: 120,
            }
        );
    }

    #[tokio::test]
    async fn pagination_respects_limit_and_offset() {
        let dao = Arc::new(MockCatalogDao {
            products: (1..=5)
                .map(|id| product(id, "Baby stroller with carrycot"))
                .collect(),
            ..MockCatalogDao::default()
        });
        let page = stage(Arc::clone(&dao))
            .run_page(2, 3)
            .await
            .expect("page runs");

        assert_eq!(page.processed, 2);
        assert_eq!(page.next_offset, 5);
        let ids: Vec<i64> = dao
            .category_updates
            .lock()
            .expect("mock lock")
            .iter()
            .map(|(id, _)| *id)
            .collect();
        let ids: HashSet<i64> = ids.into_iter().collect();
        assert_eq!(ids, HashSet::from([4, 5]));
    }
}
