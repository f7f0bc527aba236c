use async_trait::async_trait;

use crate::cluster_health::ClusterHealthResponse;
use crate::error::Result;
use crate::node_stats::NodeStatsResponse;

/// Anything that can produce the two statistics documents.
///
/// Implementations must bound every call with their own timeout; callers do
/// not race fetches against a deadline.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch node stats (all nodes or the local node, depending on configuration).
    async fn node_stats(&self) -> Result<NodeStatsResponse>;

    /// Fetch the cluster health summary.
    async fn cluster_health(&self) -> Result<ClusterHealthResponse>;

    /// Whether `node_stats` is expected to describe every node in the cluster.
    fn all_nodes(&self) -> bool;
}
