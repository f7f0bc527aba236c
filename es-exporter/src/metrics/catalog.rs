//! Static declaration of every exported series.
//!
//! [`Metric`] is the closed set of series this exporter publishes. Each
//! variant maps to a [`MetricSpec`] (name, help text, shape); the validated
//! [`Catalog`] turns those into [`MetricDescriptor`]s with the implicit
//! `cluster` and `node` labels prepended.

use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};

/// Prefix of every exported series name.
pub const NAMESPACE: &str = "elasticsearch";

pub const CLUSTER_LABEL: &str = "cluster";
pub const NODE_LABEL: &str = "node";

/// Node label value for cluster-scoped series.
pub const UNKNOWN_NODE: &str = "unknown";

/// Name of the availability series, reserved outside the catalog.
pub const UP_NAME: &str = "up";
pub const UP_HELP: &str = "Was the Elasticsearch instance query successful?";

const GC_LABELS: &[&str] = &["gc"];
const TYPE_LABELS: &[&str] = &["type"];
const BREAKER_LABELS: &[&str] = &["breaker"];
const AREA_LABELS: &[&str] = &["area"];

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four shapes a catalog entry can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricShape {
    ScalarGauge,
    ScalarCounter,
    LabeledGauge(&'static [&'static str]),
    LabeledCounter(&'static [&'static str]),
}

impl MetricShape {
    pub fn kind(self) -> MetricKind {
        match self {
            MetricShape::ScalarGauge | MetricShape::LabeledGauge(_) => MetricKind::Gauge,
            MetricShape::ScalarCounter | MetricShape::LabeledCounter(_) => MetricKind::Counter,
        }
    }

    /// Labels beyond `cluster` and `node`.
    pub fn extra_labels(self) -> &'static [&'static str] {
        match self {
            MetricShape::ScalarGauge | MetricShape::ScalarCounter => &[],
            MetricShape::LabeledGauge(labels) | MetricShape::LabeledCounter(labels) => labels,
        }
    }
}

/// Static definition of one catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub shape: MetricShape,
}

const fn spec(name: &'static str, help: &'static str, shape: MetricShape) -> MetricSpec {
    MetricSpec { name, help, shape }
}

/// Every series the exporter publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    // Cluster health (cluster-scoped)
    ClusterHealthStatus,
    ClusterHealthTimedOut,
    ClusterNumberOfNodes,
    ClusterNumberOfDataNodes,

    // Indices gauges
    IndicesFielddataMemorySize,
    IndicesFilterCacheMemorySize,
    IndicesQueryCacheMemorySize,
    IndicesRequestCacheMemorySize,
    IndicesDocs,
    IndicesDocsDeleted,
    IndicesStoreSize,
    IndicesSegmentsMemory,
    IndicesSegmentsCount,

    // Process gauges
    ProcessCpuPercent,
    ProcessMemResident,
    ProcessMemShare,
    ProcessMemVirtual,
    ProcessOpenFiles,
    ProcessMaxFiles,

    TransportServerOpen,

    // Indices counters
    IndicesFielddataEvictions,
    IndicesFilterCacheEvictions,
    IndicesQueryCacheEvictions,
    IndicesRequestCacheEvictions,
    IndicesFlushTotal,
    IndicesFlushTime,
    IndicesStoreThrottleTime,
    IndicesIndexingIndexTotal,
    IndicesIndexingIndexTime,
    IndicesMergesTotal,
    IndicesMergesDocs,
    IndicesMergesSize,
    IndicesMergesTime,
    IndicesRefreshTotal,
    IndicesRefreshTime,

    // Transport counters
    TransportRxPackets,
    TransportRxSize,
    TransportTxPackets,
    TransportTxSize,

    // Labeled gauges
    BreakersEstimatedSize,
    BreakersLimitSize,
    JvmMemoryCommitted,
    JvmMemoryUsed,
    JvmMemoryMax,
    ThreadPoolActive,
    ThreadPoolLargest,
    ThreadPoolQueue,
    ThreadPoolThreads,

    // Labeled counters
    JvmGcCollectionCount,
    JvmGcCollectionTime,
    ProcessCpuTime,
    ThreadPoolCompleted,
    ThreadPoolRejected,
    BreakersTripped,
}

impl Metric {
    /// All variants, in discriminant order.
    pub const ALL: [Metric; 54] = [
        Metric::ClusterHealthStatus,
        Metric::ClusterHealthTimedOut,
        Metric::ClusterNumberOfNodes,
        Metric::ClusterNumberOfDataNodes,
        Metric::IndicesFielddataMemorySize,
        Metric::IndicesFilterCacheMemorySize,
        Metric::IndicesQueryCacheMemorySize,
        Metric::IndicesRequestCacheMemorySize,
        Metric::IndicesDocs,
        Metric::IndicesDocsDeleted,
        Metric::IndicesStoreSize,
        Metric::IndicesSegmentsMemory,
        Metric::IndicesSegmentsCount,
        Metric::ProcessCpuPercent,
        Metric::ProcessMemResident,
        Metric::ProcessMemShare,
        Metric::ProcessMemVirtual,
        Metric::ProcessOpenFiles,
        Metric::ProcessMaxFiles,
        Metric::TransportServerOpen,
        Metric::IndicesFielddataEvictions,
        Metric::IndicesFilterCacheEvictions,
        Metric::IndicesQueryCacheEvictions,
        Metric::IndicesRequestCacheEvictions,
        Metric::IndicesFlushTotal,
        Metric::IndicesFlushTime,
        Metric::IndicesStoreThrottleTime,
        Metric::IndicesIndexingIndexTotal,
        Metric::IndicesIndexingIndexTime,
        Metric::IndicesMergesTotal,
        Metric::IndicesMergesDocs,
        Metric::IndicesMergesSize,
        Metric::IndicesMergesTime,
        Metric::IndicesRefreshTotal,
        Metric::IndicesRefreshTime,
        Metric::TransportRxPackets,
        Metric::TransportRxSize,
        Metric::TransportTxPackets,
        Metric::TransportTxSize,
        Metric::BreakersEstimatedSize,
        Metric::BreakersLimitSize,
        Metric::JvmMemoryCommitted,
        Metric::JvmMemoryUsed,
        Metric::JvmMemoryMax,
        Metric::ThreadPoolActive,
        Metric::ThreadPoolLargest,
        Metric::ThreadPoolQueue,
        Metric::ThreadPoolThreads,
        Metric::JvmGcCollectionCount,
        Metric::JvmGcCollectionTime,
        Metric::ProcessCpuTime,
        Metric::ThreadPoolCompleted,
        Metric::ThreadPoolRejected,
        Metric::BreakersTripped,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn spec(self) -> MetricSpec {
        use MetricShape::*;

        match self {
            Metric::ClusterHealthStatus => spec(
                "cluster_health_status",
                "Current cluster health status",
                ScalarGauge,
            ),
            Metric::ClusterHealthTimedOut => spec(
                "cluster_health_timed_out",
                "Current cluster health timed out",
                ScalarGauge,
            ),
            Metric::ClusterNumberOfNodes => spec(
                "cluster_number_of_nodes_total",
                "Current cluster total node size",
                ScalarGauge,
            ),
            Metric::ClusterNumberOfDataNodes => spec(
                "cluster_number_of_data_nodes_total",
                "Current cluster total data node size",
                ScalarGauge,
            ),
            Metric::IndicesFielddataMemorySize => spec(
                "indices_fielddata_memory_size_bytes",
                "Field data cache memory usage in bytes",
                ScalarGauge,
            ),
            Metric::IndicesFilterCacheMemorySize => spec(
                "indices_filter_cache_memory_size_bytes",
                "Filter cache memory usage in bytes",
                ScalarGauge,
            ),
            Metric::IndicesQueryCacheMemorySize => spec(
                "indices_query_cache_memory_size_bytes",
                "Query cache memory usage in bytes",
                ScalarGauge,
            ),
            Metric::IndicesRequestCacheMemorySize => spec(
                "indices_request_cache_memory_size_bytes",
                "Request cache memory usage in bytes",
                ScalarGauge,
            ),
            Metric::IndicesDocs => spec(
                "indices_docs",
                "Count of documents on this node",
                ScalarGauge,
            ),
            Metric::IndicesDocsDeleted => spec(
                "indices_docs_deleted",
                "Count of deleted documents on this node",
                ScalarGauge,
            ),
            Metric::IndicesStoreSize => spec(
                "indices_store_size_bytes",
                "Current size of stored index data in bytes",
                ScalarGauge,
            ),
            Metric::IndicesSegmentsMemory => spec(
                "indices_segments_memory_bytes",
                "Current memory size of segments in bytes",
                ScalarGauge,
            ),
            Metric::IndicesSegmentsCount => spec(
                "indices_segments_count",
                "Count of index segments on this node",
                ScalarGauge,
            ),
            Metric::ProcessCpuPercent => spec(
                "process_cpu_percent",
                "Percent CPU used by process",
                ScalarGauge,
            ),
            Metric::ProcessMemResident => spec(
                "process_mem_resident_size_bytes",
                "Resident memory in use by process in bytes",
                ScalarGauge,
            ),
            Metric::ProcessMemShare => spec(
                "process_mem_share_size_bytes",
                "Shared memory in use by process in bytes",
                ScalarGauge,
            ),
            Metric::ProcessMemVirtual => spec(
                "process_mem_virtual_size_bytes",
                "Total virtual memory used in bytes",
                ScalarGauge,
            ),
            Metric::ProcessOpenFiles => spec(
                "process_open_files_count",
                "Open file descriptors",
                ScalarGauge,
            ),
            Metric::ProcessMaxFiles => spec(
                "process_max_files_count",
                "Max file descriptors for process",
                ScalarGauge,
            ),
            Metric::TransportServerOpen => spec(
                "transport_server_open_count",
                "Open transport server connections",
                ScalarGauge,
            ),
            Metric::IndicesFielddataEvictions => spec(
                "indices_fielddata_evictions",
                "Evictions from field data",
                ScalarCounter,
            ),
            Metric::IndicesFilterCacheEvictions => spec(
                "indices_filter_cache_evictions",
                "Evictions from filter cache",
                ScalarCounter,
            ),
            Metric::IndicesQueryCacheEvictions => spec(
                "indices_query_cache_evictions",
                "Evictions from query cache",
                ScalarCounter,
            ),
            Metric::IndicesRequestCacheEvictions => spec(
                "indices_request_cache_evictions",
                "Evictions from request cache",
                ScalarCounter,
            ),
            Metric::IndicesFlushTotal => spec("indices_flush_total", "Total flushes", ScalarCounter),
            Metric::IndicesFlushTime => spec(
                "indices_flush_time_ms_total",
                "Cumulative flush time in milliseconds",
                ScalarCounter,
            ),
            Metric::IndicesStoreThrottleTime => spec(
                "indices_store_throttle_time_ms_total",
                "Throttle time for index store in milliseconds",
                ScalarCounter,
            ),
            Metric::IndicesIndexingIndexTotal => spec(
                "indices_indexing_index_total",
                "Total index calls",
                ScalarCounter,
            ),
            Metric::IndicesIndexingIndexTime => spec(
                "indices_indexing_index_time_ms_total",
                "Cumulative index time in milliseconds",
                ScalarCounter,
            ),
            Metric::IndicesMergesTotal => spec("indices_merges_total", "Total merges", ScalarCounter),
            Metric::IndicesMergesDocs => spec(
                "indices_merges_total_docs_total",
                "Cumulative docs merged",
                ScalarCounter,
            ),
            Metric::IndicesMergesSize => spec(
                "indices_merges_total_size_bytes_total",
                "Total merge size in bytes",
                ScalarCounter,
            ),
            Metric::IndicesMergesTime => spec(
                "indices_merges_total_time_ms_total",
                "Total time spent merging in milliseconds",
                ScalarCounter,
            ),
            Metric::IndicesRefreshTotal => {
                spec("indices_refresh_total", "Total refreshes", ScalarCounter)
            }
            Metric::IndicesRefreshTime => spec(
                "indices_refresh_total_time_ms_total",
                "Total time spent refreshing in milliseconds",
                ScalarCounter,
            ),
            Metric::TransportRxPackets => spec(
                "transport_rx_packets_total",
                "Count of packets received",
                ScalarCounter,
            ),
            Metric::TransportRxSize => spec(
                "transport_rx_size_bytes_total",
                "Total number of bytes received",
                ScalarCounter,
            ),
            Metric::TransportTxPackets => spec(
                "transport_tx_packets_total",
                "Count of packets sent",
                ScalarCounter,
            ),
            Metric::TransportTxSize => spec(
                "transport_tx_size_bytes_total",
                "Total number of bytes sent",
                ScalarCounter,
            ),
            Metric::BreakersEstimatedSize => spec(
                "breakers_estimated_size_bytes",
                "Estimated size in bytes of breaker",
                LabeledGauge(BREAKER_LABELS),
            ),
            Metric::BreakersLimitSize => spec(
                "breakers_limit_size_bytes",
                "Limit size in bytes for breaker",
                LabeledGauge(BREAKER_LABELS),
            ),
            Metric::JvmMemoryCommitted => spec(
                "jvm_memory_committed_bytes",
                "JVM memory currently committed by area",
                LabeledGauge(AREA_LABELS),
            ),
            Metric::JvmMemoryUsed => spec(
                "jvm_memory_used_bytes",
                "JVM memory currently used by area",
                LabeledGauge(AREA_LABELS),
            ),
            Metric::JvmMemoryMax => spec(
                "jvm_memory_max_bytes",
                "JVM memory max",
                LabeledGauge(AREA_LABELS),
            ),
            Metric::ThreadPoolActive => spec(
                "thread_pool_active_count",
                "Thread Pool threads active",
                LabeledGauge(TYPE_LABELS),
            ),
            Metric::ThreadPoolLargest => spec(
                "thread_pool_largest_count",
                "Thread Pool largest threads count",
                LabeledGauge(TYPE_LABELS),
            ),
            Metric::ThreadPoolQueue => spec(
                "thread_pool_queue_count",
                "Thread Pool operations queued",
                LabeledGauge(TYPE_LABELS),
            ),
            Metric::ThreadPoolThreads => spec(
                "thread_pool_threads_count",
                "Thread Pool current threads count",
                LabeledGauge(TYPE_LABELS),
            ),
            Metric::JvmGcCollectionCount => spec(
                "jvm_gc_collection_seconds_count",
                "Count of JVM GC runs",
                LabeledCounter(GC_LABELS),
            ),
            Metric::JvmGcCollectionTime => spec(
                "jvm_gc_collection_seconds_sum",
                "GC run time in seconds",
                LabeledCounter(GC_LABELS),
            ),
            Metric::ProcessCpuTime => spec(
                "process_cpu_time_seconds_sum",
                "Process CPU time in seconds",
                LabeledCounter(TYPE_LABELS),
            ),
            Metric::ThreadPoolCompleted => spec(
                "thread_pool_completed_count",
                "Thread Pool operations completed",
                LabeledCounter(TYPE_LABELS),
            ),
            Metric::ThreadPoolRejected => spec(
                "thread_pool_rejected_count",
                "Thread Pool operations rejected",
                LabeledCounter(TYPE_LABELS),
            ),
            Metric::BreakersTripped => spec(
                "breakers_tripped",
                "Number of times the breaker tripped",
                LabeledCounter(BREAKER_LABELS),
            ),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full definition of one exported series name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub metric: Metric,
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    /// `cluster`, `node`, then the shape's extra labels.
    pub label_names: Vec<&'static str>,
}

impl MetricDescriptor {
    pub fn new(metric: Metric) -> Self {
        let spec = metric.spec();
        let mut label_names = vec![CLUSTER_LABEL, NODE_LABEL];
        label_names.extend_from_slice(spec.shape.extra_labels());

        Self {
            metric,
            name: spec.name,
            help: spec.help,
            kind: spec.shape.kind(),
            label_names,
        }
    }

    pub fn arity(&self) -> usize {
        self.label_names.len()
    }
}

/// Validated, read-only table of descriptors indexed by [`Metric`].
#[derive(Debug, Clone)]
pub struct Catalog {
    descriptors: Vec<MetricDescriptor>,
}

impl Catalog {
    /// Build and validate the catalog for every [`Metric`].
    pub fn new() -> Result<Self> {
        let descriptors = Metric::ALL.iter().copied().map(MetricDescriptor::new).collect();
        Self::from_descriptors(descriptors)
    }

    pub(crate) fn from_descriptors(descriptors: Vec<MetricDescriptor>) -> Result<Self> {
        validate(&descriptors)?;
        Ok(Self { descriptors })
    }

    pub fn descriptor(&self, metric: Metric) -> &MetricDescriptor {
        &self.descriptors[metric.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn validate(descriptors: &[MetricDescriptor]) -> Result<()> {
    if descriptors.len() != Metric::ALL.len() {
        return Err(Error::catalog(format!(
            "expected {} descriptors, got {}",
            Metric::ALL.len(),
            descriptors.len()
        )));
    }

    let mut names = HashSet::with_capacity(descriptors.len());
    for (position, descriptor) in descriptors.iter().enumerate() {
        let name = descriptor.name;

        if descriptor.metric.index() != position {
            return Err(Error::catalog(format!(
                "{name} is at position {position}, expected {}",
                descriptor.metric.index()
            )));
        }
        if !is_valid_metric_name(name) {
            return Err(Error::catalog(format!("invalid series name '{name}'")));
        }
        if name == UP_NAME {
            return Err(Error::catalog("'up' is reserved for availability"));
        }
        if !names.insert(name) {
            return Err(Error::catalog(format!("duplicate series name '{name}'")));
        }
        if descriptor.help.trim().is_empty() {
            return Err(Error::catalog(format!("{name} has empty help text")));
        }

        if descriptor.label_names.get(..2) != Some(&[CLUSTER_LABEL, NODE_LABEL][..]) {
            return Err(Error::catalog(format!(
                "{name} must start with the cluster and node labels"
            )));
        }
        let mut labels = HashSet::with_capacity(descriptor.label_names.len());
        for label in &descriptor.label_names {
            if !is_valid_label_name(label) {
                return Err(Error::catalog(format!("{name} has invalid label '{label}'")));
            }
            if !labels.insert(*label) {
                return Err(Error::catalog(format!("{name} repeats label '{label}'")));
            }
        }
    }

    Ok(())
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with("__")
}
