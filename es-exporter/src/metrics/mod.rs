//! Metric catalog, registry, collection cycle and Prometheus exposition.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use es_exporter::metrics::{Catalog, Collector, PrometheusExporter};
//!
//! let catalog = Arc::new(Catalog::new()?);
//! let collector = Arc::new(Collector::new(source, catalog));
//! let exporter = PrometheusExporter::new(collector);
//! let body = exporter.export().await;
//! ```

mod catalog;
mod cycle;
mod populate;
mod prometheus;
mod registry;

pub use catalog::{
    CLUSTER_LABEL, Catalog, Metric, MetricDescriptor, MetricKind, MetricShape, MetricSpec,
    NAMESPACE, NODE_LABEL, UNKNOWN_NODE, UP_HELP, UP_NAME,
};
pub use cycle::{Collector, CyclePhase, CycleReport, Scrape};
pub use populate::{node_label, populate_health, populate_node};
pub use prometheus::{CONTENT_TYPE, PrometheusExporter, render};
pub use registry::{LabelValues, MetricFamily, MetricRegistry, RegistrySnapshot, Series};
