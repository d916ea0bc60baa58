use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::error;

use crate::{api::auth, app::AppState, pipeline::RankingOutcome};

#[derive(Debug, Serialize)]
struct RankingResponse {
    success: bool,
    data: RankingOutcome,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

pub(crate) async fn update(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(rejection) = auth::require_admin(&state, &headers) {
        return rejection;
    }

    match state.ranking().run().await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(RankingResponse {
                success: true,
                data: outcome,
            }),
        )
            .into_response(),
        Err(err) => {
            error!(error = ?err, "ranking update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    error: format!("{err:#}"),
                }),
            )
                .into_response()
        }
    }
}
