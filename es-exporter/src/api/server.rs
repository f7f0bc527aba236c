//! API server setup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api::routes;
use crate::error::{Error, Result};
use crate::metrics::PrometheusExporter;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Runs a collection cycle per metrics request
    pub exporter: Arc<PrometheusExporter>,
    /// Path the exposition is served under
    pub metrics_path: String,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    pub fn new(exporter: Arc<PrometheusExporter>, metrics_path: impl Into<String>) -> Self {
        Self {
            exporter,
            metrics_path: metrics_path.into(),
            start_time: Instant::now(),
        }
    }
}

/// Build the router with all middleware and routes.
pub fn router(state: AppState) -> Router {
    routes::router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request| {
                if req.uri().path() == "/health" {
                    Span::none()
                } else {
                    let mut make_span =
                        tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::DEBUG);
                    use tower_http::trace::MakeSpan;
                    make_span.make_span(req)
                }
            })
            .on_response(
                |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                    if span.is_disabled() {
                        return;
                    }
                    let on_response =
                        tower_http::trace::DefaultOnResponse::new().level(tracing::Level::DEBUG);
                    use tower_http::trace::OnResponse;
                    on_response.on_response(res, latency, span);
                },
            ),
    )
}

/// HTTP server for the exporter.
pub struct ApiServer {
    listen_address: SocketAddr,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn new(listen_address: SocketAddr, state: AppState) -> Self {
        Self {
            listen_address,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Bind and serve until the cancellation token fires.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_address).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            "Listening on http://{}{}",
            addr,
            self.state.metrics_path
        );

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("HTTP server shutting down...");
            })
            .await
            .map_err(|e| Error::Api(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

/// Cancel `token` on Ctrl-C or SIGTERM.
pub async fn shutdown_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
    token.cancel();
}
