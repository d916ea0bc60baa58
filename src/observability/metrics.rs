use anyhow::Result;
use prometheus::{
    Histogram, IntCounter, Registry, register_histogram_with_registry,
    register_int_counter_with_registry,
};

/// Counters and histograms for the classification and ranking pipeline.
#[derive(Debug)]
pub struct Metrics {
    pub classifications_total: IntCounter,
    pub products_reclassified_total: IntCounter,
    pub reclassify_pages_total: IntCounter,
    pub ranking_upserts_total: IntCounter,
    pub ranking_failures_total: IntCounter,
    pub views_tracked_total: IntCounter,
    pub views_deduplicated_total: IntCounter,
    pub auth_rejections_total: IntCounter,
    pub rate_limited_total: IntCounter,
    pub reclassify_page_duration_seconds: Histogram,
    pub ranking_run_duration_seconds: Histogram,
}

impl Metrics {
    /// Register every metric family on `registry`.
    ///
    /// # Errors
    /// Returns an error when a metric with the same name is already
    /// registered.
    pub fn new(registry: &Registry) -> Result<Self> {
        let classifications_total = register_int_counter_with_registry!(
            "catalog_classifications_total",
            "Number of classification requests evaluated",
            registry
        )?;
        let products_reclassified_total = register_int_counter_with_registry!(
            "catalog_products_reclassified_total",
            "Number of products whose category assignment was persisted",
            registry
        )?;
        let reclassify_pages_total = register_int_counter_with_registry!(
            "catalog_reclassify_pages_total",
            "Number of reclassification pages processed",
            registry
        )?;
        let ranking_upserts_total = register_int_counter_with_registry!(
            "catalog_ranking_upserts_total",
            "Number of ranking scores written to the store",
            registry
        )?;
        let ranking_failures_total = register_int_counter_with_registry!(
            "catalog_ranking_failures_total",
            "Number of ranking score writes that failed",
            registry
        )?;
        let views_tracked_total = register_int_counter_with_registry!(
            "catalog_views_tracked_total",
            "Number of product views counted",
            registry
        )?;
        let views_deduplicated_total = register_int_counter_with_registry!(
            "catalog_views_deduplicated_total",
            "Number of product views skipped as repeats within the session window",
            registry
        )?;
        let auth_rejections_total = register_int_counter_with_registry!(
            "catalog_auth_rejections_total",
            "Number of admin requests rejected for a bad credential",
            registry
        )?;
        let rate_limited_total = register_int_counter_with_registry!(
            "catalog_rate_limited_total",
            "Number of admin requests rejected by the rate limiter",
            registry
        )?;
        let reclassify_page_duration_seconds = register_histogram_with_registry!(
            "catalog_reclassify_page_duration_seconds",
            "Wall time spent processing one reclassification page",
            vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            registry
        )?;
        let ranking_run_duration_seconds = register_histogram_with_registry!(
            "catalog_ranking_run_duration_seconds",
            "Wall time spent recomputing ranking scores for the catalog",
            vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            registry
        )?;

        Ok(Self {
            classifications_total,
            products_reclassified_total,
            reclassify_pages_total,
            ranking_upserts_total,
            ranking_failures_total,
            views_tracked_total,
            views_deduplicated_total,
            auth_rejections_total,
            rate_limited_total,
            reclassify_page_duration_seconds,
            ranking_run_duration_seconds,
        })
    }
}
