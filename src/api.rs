pub(crate) mod auth;
pub(crate) mod classify;
pub(crate) mod health;
pub(crate) mod metrics;
pub(crate) mod ranking;
pub(crate) mod reclassify;
pub(crate) mod view;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .route("/v1/classify", post(classify::classify))
        .route("/v1/admin/reclassify", post(reclassify::run_page))
        .route("/v1/admin/ranking/update", post(ranking::update))
        .route("/v1/analytics/view", post(view::track))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
