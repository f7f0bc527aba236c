//! Elasticsearch statistics documents and the client that fetches them.
//!
//! The crate covers the two read-only endpoints a monitoring exporter needs:
//!
//! - `GET /_nodes/stats` (or `/_nodes/_local/stats`) decoded into [`NodeStatsResponse`]
//! - `GET /_cluster/health` decoded into [`ClusterHealthResponse`]
//!
//! [`StatsSource`] is the seam consumers fetch through; [`EsClient`] is the
//! HTTP implementation.

pub mod client;
pub mod cluster_health;
pub mod error;
pub mod node_stats;
pub mod source;

pub use client::{EsClient, EsClientConfig};
pub use cluster_health::{ClusterHealthResponse, HealthStatus};
pub use error::{ClientError, Result};
pub use node_stats::NodeStatsResponse;
pub use source::StatsSource;
