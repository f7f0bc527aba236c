//! `/_nodes/stats` response model.
//!
//! Only the sections the exporter publishes are modelled. Every section
//! defaults to zero so that documents from server versions that dropped or
//! have not yet introduced a section still decode.
//!
//! Numbers are signed: the server reports `-1` for values the platform
//! cannot measure (process CPU times, shared and virtual memory, file
//! descriptors).

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level node stats document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeStatsResponse {
    #[serde(default)]
    pub cluster_name: String,
    /// Node id -> stats for that node.
    #[serde(default)]
    pub nodes: HashMap<String, NodeStats>,
}

impl NodeStatsResponse {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Stats reported by one node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeStats {
    pub name: String,
    pub host: String,
    pub jvm: JvmStats,
    pub breakers: HashMap<String, BreakerStats>,
    pub thread_pool: HashMap<String, ThreadPoolStats>,
    pub indices: IndicesStats,
    pub transport: TransportStats,
    pub process: ProcessStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmStats {
    pub gc: GcStats,
    pub mem: JvmMemStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GcStats {
    pub collectors: HashMap<String, GcCollectorStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GcCollectorStats {
    pub collection_count: i64,
    pub collection_time_in_millis: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmMemStats {
    pub heap_used_in_bytes: i64,
    pub heap_committed_in_bytes: i64,
    pub heap_max_in_bytes: i64,
    pub non_heap_used_in_bytes: i64,
    pub non_heap_committed_in_bytes: i64,
}

/// Circuit breaker state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BreakerStats {
    pub estimated_size_in_bytes: i64,
    pub limit_size_in_bytes: i64,
    pub tripped: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreadPoolStats {
    pub threads: i64,
    pub queue: i64,
    pub active: i64,
    pub rejected: i64,
    pub largest: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndicesStats {
    pub docs: DocsStats,
    pub store: StoreStats,
    pub indexing: IndexingStats,
    pub merges: MergesStats,
    pub refresh: RefreshStats,
    pub flush: FlushStats,
    pub fielddata: CacheStats,
    pub filter_cache: CacheStats,
    pub query_cache: CacheStats,
    pub request_cache: CacheStats,
    pub segments: SegmentsStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocsStats {
    pub count: i64,
    pub deleted: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreStats {
    pub size_in_bytes: i64,
    pub throttle_time_in_millis: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexingStats {
    pub index_total: i64,
    pub index_time_in_millis: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergesStats {
    pub total: i64,
    pub total_time_in_millis: i64,
    pub total_docs: i64,
    pub total_size_in_bytes: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefreshStats {
    pub total: i64,
    pub total_time_in_millis: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlushStats {
    pub total: i64,
    pub total_time_in_millis: i64,
}

/// Shared shape of the fielddata, filter, query and request caches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    pub memory_size_in_bytes: i64,
    pub evictions: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SegmentsStats {
    pub count: i64,
    pub memory_in_bytes: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransportStats {
    pub server_open: i64,
    pub rx_count: i64,
    pub rx_size_in_bytes: i64,
    pub tx_count: i64,
    pub tx_size_in_bytes: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessStats {
    pub cpu: ProcessCpuStats,
    pub mem: ProcessMemStats,
    pub open_file_descriptors: i64,
    pub max_file_descriptors: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessCpuStats {
    pub percent: i64,
    pub sys_in_millis: i64,
    pub user_in_millis: i64,
    pub total_in_millis: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessMemStats {
    pub resident_in_bytes: i64,
    pub share_in_bytes: i64,
    pub total_virtual_in_bytes: i64,
}
