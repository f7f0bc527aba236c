//! Metrics exposition and landing page.

use axum::{
    Router,
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};

use crate::api::server::AppState;
use crate::metrics::CONTENT_TYPE;

/// Create the metrics router serving `metrics_path` and the landing page.
pub fn router(metrics_path: &str) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(metrics_path, get(metrics))
}

/// Run one collection cycle and return the exposition.
///
/// Always 200: upstream failures show up as `up 0` in the body.
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.exporter.export().await;
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Elasticsearch Exporter</title></head>\n\
         <body>\n\
         <h1>Elasticsearch Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        state.metrics_path
    ))
}
