//! Route definitions.

pub mod health;
pub mod metrics;

use axum::Router;

use crate::api::server::AppState;

/// Build the full router for the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(metrics::router(&state.metrics_path))
        .nest("/health", health::router())
        .with_state(state)
}
