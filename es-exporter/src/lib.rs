//! Prometheus exporter for Elasticsearch node and cluster statistics.
//!
//! Every scrape of the metrics endpoint runs one collection cycle: the node
//! stats and cluster health documents are fetched, the registry is reset and
//! repopulated, and the result is rendered in the Prometheus text format.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{Error, Result};
