//! Admin credential check with per-caller attempt limiting.
//!
//! The limiter keys on `ip:presented_key`, so a spoofed key burns the
//! attacker's budget without locking out an operator holding the real key
//! behind the same proxy.

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use crate::app::AppState;

const API_KEY_HEADER: &str = "x-api-key";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

#[derive(Debug, Serialize)]
struct AuthError {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

/// Gate an admin request. `Err` carries the ready-to-send rejection.
pub(crate) fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let ip = client_ip(headers);
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let identifier = format!("{ip}:{presented}");

    let decision = state.rate_limiter().check(&identifier);
    if !decision.allowed {
        state.telemetry().metrics().rate_limited_total.inc();
        warn!(%ip, "admin request rate limited");
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(AuthError {
                error: "too many attempts, try again later",
                retry_after_secs: Some(decision.reset_in.as_secs()),
            }),
        )
            .into_response());
    }

    if !constant_time_eq(presented.as_bytes(), state.config().admin_api_key().as_bytes()) {
        state.telemetry().metrics().auth_rejections_total.inc();
        warn!(%ip, "admin request with invalid API key");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(AuthError {
                error: "invalid API key",
                retry_after_secs: None,
            }),
        )
            .into_response());
    }

    state.rate_limiter().reset(&identifier);
    Ok(())
}

/// First hop of `X-Forwarded-For`, or a fixed marker when absent.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Comparison time depends only on the lengths, not on where bytes differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
