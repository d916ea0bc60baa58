//! Popularity ranking over the whole catalog.
//!
//! The score is a fixed linear blend of sales, views and rating, with a flat
//! bonus for a sale within the last week. Scores are recomputed from scratch
//! on every run and upserted per product; a failed write is counted and
//! skipped so one bad row never loses the rest of the run.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::observability::metrics::Metrics;
use crate::store::{CatalogDao, RankingSource};

const W_SALES: f64 = 10.0;
const W_VIEWS: f64 = 0.5;
const W_RATING: f64 = 20.0;
const RECENCY_BONUS: f64 = 50.0;
const RECENCY_WINDOW_DAYS: i64 = 7;

/// One line of the run summary, ordered by score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub product_id: i64,
    pub name: String,
    pub score: f64,
}

/// Outcome of one full ranking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingOutcome {
    pub updated: usize,
    pub failed: usize,
    pub top: Vec<RankingEntry>,
}

pub struct RankingStage {
    dao: Arc<dyn CatalogDao>,
    top_n: usize,
    metrics: Arc<Metrics>,
}

impl RankingStage {
    #[must_use]
    pub fn new(dao: Arc<dyn CatalogDao>, top_n: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            dao,
            top_n,
            metrics,
        }
    }

    /// Recompute and persist the ranking score for every product.
    ///
    /// # Errors
    /// Returns an error only when the catalog cannot be read; per-product
    /// write failures are counted in the outcome instead.
    pub async fn run(&self) -> Result<RankingOutcome> {
        let started = Instant::now();
        let sources = self.dao.fetch_ranking_sources().await?;
        let now = Utc::now();

        let mut scored: Vec<RankingEntry> = sources
            .iter()
            .map(|source| RankingEntry {
                product_id: source.product_id,
                name: source.name.clone(),
                score: compute_score(source, now),
            })
            .collect();

        let mut updated = 0usize;
        let mut failed = 0usize;
        for entry in &scored {
            match self
                .dao
                .upsert_ranking_score(entry.product_id, entry.score)
                .await
            {
                Ok(()) => {
                    self.metrics.ranking_upserts_total.inc();
                    updated += 1;
                }
                Err(error) => {
                    self.metrics.ranking_failures_total.inc();
                    failed += 1;
                    warn!(
                        product_id = entry.product_id,
                        error = %error,
                        "failed to persist ranking score"
                    );
                }
            }
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.top_n);

        self.metrics
            .ranking_run_duration_seconds
            .observe(started.elapsed().as_secs_f64());
        info!(updated, failed, "ranking run complete");

        Ok(RankingOutcome {
            updated,
            failed,
            top: scored,
        })
    }
}

/// The ranking formula, rounded to two decimals.
#[must_use]
pub fn compute_score(source: &RankingSource, now: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let mut score = source.sales_count as f64 * W_SALES
        + source.views_count as f64 * W_VIEWS
        + source.rating * W_RATING;

    if let Some(last_sale_at) = source.last_sale_at {
        if now - last_sale_at <= Duration::days(RECENCY_WINDOW_DAYS) {
            score += RECENCY_BONUS;
        }
    }

    round2(score)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
