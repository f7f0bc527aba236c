//! Mapping from stats documents onto catalog series.
//!
//! Node-scoped series are keyed by `(cluster, node host)`, cluster-scoped
//! ones by `(cluster, "unknown")`. Upstream counters are cumulative, so
//! every value is stored as observed rather than accumulated locally.

use es_stats::node_stats::NodeStats;
use es_stats::{ClusterHealthResponse, HealthStatus};
use tracing::debug;

use super::catalog::{Metric, UNKNOWN_NODE};
use super::registry::MetricRegistry;

const MILLIS_PER_SECOND: f64 = 1000.0;

fn seconds(millis: i64) -> f64 {
    millis as f64 / MILLIS_PER_SECOND
}

fn bool_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

#[derive(Clone, Copy)]
struct Scope<'a> {
    cluster: &'a str,
    node: &'a str,
}

impl<'a> Scope<'a> {
    fn labels(self) -> [&'a str; 2] {
        [self.cluster, self.node]
    }

    fn with<'b>(self, extra: &'b str) -> [&'b str; 3]
    where
        'a: 'b,
    {
        [self.cluster, self.node, extra]
    }
}

/// Label value identifying a node: its host, falling back to name, then id.
pub fn node_label<'a>(node_id: &'a str, node: &'a NodeStats) -> &'a str {
    [node.host.as_str(), node.name.as_str(), node_id]
        .into_iter()
        .find(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_NODE)
}

/// Populate every node-scoped series for one node.
pub fn populate_node(registry: &mut MetricRegistry, cluster: &str, node_id: &str, node: &NodeStats) {
    let scope = Scope {
        cluster,
        node: node_label(node_id, node),
    };

    populate_jvm(registry, scope, node);
    populate_breakers(registry, scope, node);
    populate_thread_pools(registry, scope, node);
    populate_indices(registry, scope, node);
    populate_transport(registry, scope, node);
    populate_process(registry, scope, node);
}

fn populate_jvm(registry: &mut MetricRegistry, scope: Scope<'_>, node: &NodeStats) {
    for (collector, gc) in &node.jvm.gc.collectors {
        let labels = scope.with(collector);
        registry.set(Metric::JvmGcCollectionCount, &labels, gc.collection_count as f64);
        registry.set(Metric::JvmGcCollectionTime, &labels, seconds(gc.collection_time_in_millis));
    }

    let mem = &node.jvm.mem;
    let heap = scope.with("heap");
    registry.set(Metric::JvmMemoryCommitted, &heap, mem.heap_committed_in_bytes as f64);
    registry.set(Metric::JvmMemoryUsed, &heap, mem.heap_used_in_bytes as f64);
    registry.set(Metric::JvmMemoryMax, &heap, mem.heap_max_in_bytes as f64);

    // Non-heap has no configured maximum.
    let non_heap = scope.with("non-heap");
    registry.set(Metric::JvmMemoryCommitted, &non_heap, mem.non_heap_committed_in_bytes as f64);
    registry.set(Metric::JvmMemoryUsed, &non_heap, mem.non_heap_used_in_bytes as f64);
}

fn populate_breakers(registry: &mut MetricRegistry, scope: Scope<'_>, node: &NodeStats) {
    for (breaker, stats) in &node.breakers {
        let labels = scope.with(breaker);
        registry.set(Metric::BreakersEstimatedSize, &labels, stats.estimated_size_in_bytes as f64);
        registry.set(Metric::BreakersLimitSize, &labels, stats.limit_size_in_bytes as f64);
        registry.set(Metric::BreakersTripped, &labels, stats.tripped as f64);
    }
}

fn populate_thread_pools(registry: &mut MetricRegistry, scope: Scope<'_>, node: &NodeStats) {
    for (pool, stats) in &node.thread_pool {
        let labels = scope.with(pool);
        registry.set(Metric::ThreadPoolCompleted, &labels, stats.completed as f64);
        registry.set(Metric::ThreadPoolRejected, &labels, stats.rejected as f64);
        registry.set(Metric::ThreadPoolActive, &labels, stats.active as f64);
        registry.set(Metric::ThreadPoolThreads, &labels, stats.threads as f64);
        registry.set(Metric::ThreadPoolLargest, &labels, stats.largest as f64);
        registry.set(Metric::ThreadPoolQueue, &labels, stats.queue as f64);
    }
}

fn populate_indices(registry: &mut MetricRegistry, scope: Scope<'_>, node: &NodeStats) {
    let labels = scope.labels();
    let indices = &node.indices;

    let caches = [
        (
            &indices.fielddata,
            Metric::IndicesFielddataMemorySize,
            Metric::IndicesFielddataEvictions,
        ),
        (
            &indices.filter_cache,
            Metric::IndicesFilterCacheMemorySize,
            Metric::IndicesFilterCacheEvictions,
        ),
        (
            &indices.query_cache,
            Metric::IndicesQueryCacheMemorySize,
            Metric::IndicesQueryCacheEvictions,
        ),
        (
            &indices.request_cache,
            Metric::IndicesRequestCacheMemorySize,
            Metric::IndicesRequestCacheEvictions,
        ),
    ];
    for (cache, memory, evictions) in caches {
        registry.set(memory, &labels, cache.memory_size_in_bytes as f64);
        registry.set(evictions, &labels, cache.evictions as f64);
    }

    registry.set(Metric::IndicesDocs, &labels, indices.docs.count as f64);
    registry.set(Metric::IndicesDocsDeleted, &labels, indices.docs.deleted as f64);

    registry.set(Metric::IndicesSegmentsMemory, &labels, indices.segments.memory_in_bytes as f64);
    registry.set(Metric::IndicesSegmentsCount, &labels, indices.segments.count as f64);

    registry.set(Metric::IndicesStoreSize, &labels, indices.store.size_in_bytes as f64);
    registry.set(
        Metric::IndicesStoreThrottleTime,
        &labels,
        indices.store.throttle_time_in_millis as f64,
    );

    registry.set(Metric::IndicesFlushTotal, &labels, indices.flush.total as f64);
    registry.set(Metric::IndicesFlushTime, &labels, indices.flush.total_time_in_millis as f64);

    registry.set(Metric::IndicesIndexingIndexTotal, &labels, indices.indexing.index_total as f64);
    registry.set(
        Metric::IndicesIndexingIndexTime,
        &labels,
        indices.indexing.index_time_in_millis as f64,
    );

    registry.set(Metric::IndicesMergesTotal, &labels, indices.merges.total as f64);
    registry.set(Metric::IndicesMergesDocs, &labels, indices.merges.total_docs as f64);
    registry.set(Metric::IndicesMergesSize, &labels, indices.merges.total_size_in_bytes as f64);
    registry.set(Metric::IndicesMergesTime, &labels, indices.merges.total_time_in_millis as f64);

    registry.set(Metric::IndicesRefreshTotal, &labels, indices.refresh.total as f64);
    registry.set(Metric::IndicesRefreshTime, &labels, indices.refresh.total_time_in_millis as f64);
}

fn populate_transport(registry: &mut MetricRegistry, scope: Scope<'_>, node: &NodeStats) {
    let labels = scope.labels();
    let transport = &node.transport;

    registry.set(Metric::TransportServerOpen, &labels, transport.server_open as f64);
    registry.set(Metric::TransportRxPackets, &labels, transport.rx_count as f64);
    registry.set(Metric::TransportRxSize, &labels, transport.rx_size_in_bytes as f64);
    registry.set(Metric::TransportTxPackets, &labels, transport.tx_count as f64);
    registry.set(Metric::TransportTxSize, &labels, transport.tx_size_in_bytes as f64);
}

fn populate_process(registry: &mut MetricRegistry, scope: Scope<'_>, node: &NodeStats) {
    let labels = scope.labels();
    let process = &node.process;

    registry.set(Metric::ProcessCpuPercent, &labels, process.cpu.percent as f64);
    registry.set(Metric::ProcessMemResident, &labels, process.mem.resident_in_bytes as f64);
    registry.set(Metric::ProcessMemShare, &labels, process.mem.share_in_bytes as f64);
    registry.set(Metric::ProcessMemVirtual, &labels, process.mem.total_virtual_in_bytes as f64);
    registry.set(Metric::ProcessOpenFiles, &labels, process.open_file_descriptors as f64);
    registry.set(Metric::ProcessMaxFiles, &labels, process.max_file_descriptors as f64);

    for (kind, millis) in [
        ("total", process.cpu.total_in_millis),
        ("sys", process.cpu.sys_in_millis),
        ("user", process.cpu.user_in_millis),
    ] {
        registry.set(Metric::ProcessCpuTime, &scope.with(kind), seconds(millis));
    }
}

/// Populate the cluster-scoped health series.
pub fn populate_health(registry: &mut MetricRegistry, health: &ClusterHealthResponse) {
    let labels = [health.cluster_name.as_str(), UNKNOWN_NODE];

    let status = health.health_status();
    if status == HealthStatus::Other {
        debug!(status = %health.status, "Unrecognized cluster health status");
    }
    registry.set(Metric::ClusterHealthStatus, &labels, f64::from(status.ordinal()));
    registry.set(Metric::ClusterHealthTimedOut, &labels, bool_value(health.timed_out));
    registry.set(Metric::ClusterNumberOfNodes, &labels, health.number_of_nodes as f64);
    registry.set(Metric::ClusterNumberOfDataNodes, &labels, health.number_of_data_nodes as f64);
}
