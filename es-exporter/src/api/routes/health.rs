//! Health check routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::api::server::AppState;

#[derive(Debug, Serialize)]
struct LivenessResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
}

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(liveness_check))
}

/// Liveness check - is the exporter process responsive?
///
/// Does not touch the upstream cluster; availability is reported by the
/// `up` series instead.
async fn liveness_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LivenessResponse {
            status: "alive",
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.start_time.elapsed().as_secs(),
        }),
    )
}
