//! HTTP surface: metrics exposition, landing page and liveness.

pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState, router, shutdown_on_signal};
