//! Collection cycle: reset, fetch, populate and snapshot under one lock.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use es_stats::{ClientError, StatsSource};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use super::catalog::Catalog;
use super::populate::{populate_health, populate_node};
use super::registry::{MetricRegistry, RegistrySnapshot};

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    #[default]
    Idle,
    Fetching,
    Parsing,
    Resetting,
    Populating,
    Exposing,
    Failed,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Fetching => "fetching",
            CyclePhase::Parsing => "parsing",
            CyclePhase::Resetting => "resetting",
            CyclePhase::Populating => "populating",
            CyclePhase::Exposing => "exposing",
            CyclePhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of one finished cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Node stats were fetched and decoded.
    pub up: bool,
    /// Nodes present in the node stats document.
    pub nodes: usize,
    /// Cluster health series were populated.
    pub health_collected: bool,
    /// Phase the cycle ended in: `Exposing` on success, `Failed` otherwise.
    pub final_phase: CyclePhase,
    pub duration: Duration,
}

/// Result of one cycle: the values to expose and how they were obtained.
#[derive(Debug, Clone)]
pub struct Scrape {
    pub snapshot: RegistrySnapshot,
    pub report: CycleReport,
}

struct PhaseTracker {
    phase: CyclePhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: CyclePhase::Idle,
        }
    }

    fn enter(&mut self, next: CyclePhase) {
        trace!(from = %self.phase, to = %next, "Cycle phase");
        self.phase = next;
    }
}

/// Owns the registry and runs collection cycles against a stats source.
///
/// Concurrent callers queue on the registry lock; each gets its own fresh
/// upstream fetch.
pub struct Collector {
    source: Arc<dyn StatsSource>,
    registry: Mutex<MetricRegistry>,
}

impl Collector {
    pub fn new(source: Arc<dyn StatsSource>, catalog: Arc<Catalog>) -> Self {
        Self {
            source,
            registry: Mutex::new(MetricRegistry::new(catalog)),
        }
    }

    /// Run one full cycle and return a snapshot of its result.
    ///
    /// Never fails: upstream errors surface as `up == false` or as absent
    /// health series.
    pub async fn collect(&self) -> Scrape {
        let mut registry = self.registry.lock().await;
        let started = Instant::now();
        let mut tracker = PhaseTracker::new();

        tracker.enter(CyclePhase::Resetting);
        registry.reset();

        let mut report = CycleReport {
            up: false,
            nodes: 0,
            health_collected: false,
            final_phase: CyclePhase::Failed,
            duration: Duration::ZERO,
        };

        tracker.enter(CyclePhase::Fetching);
        match self.source.node_stats().await {
            Ok(stats) => {
                tracker.enter(CyclePhase::Parsing);
                registry.set_up(true);
                report.up = true;
                report.nodes = stats.node_count();

                if !self.source.all_nodes() && stats.node_count() != 1 {
                    warn!(
                        nodes = stats.node_count(),
                        "Unexpected number of nodes returned for local node stats"
                    );
                }

                tracker.enter(CyclePhase::Populating);
                for (node_id, node) in &stats.nodes {
                    populate_node(&mut registry, &stats.cluster_name, node_id, node);
                }

                tracker.enter(CyclePhase::Fetching);
                match self.source.cluster_health().await {
                    Ok(health) => {
                        tracker.enter(CyclePhase::Populating);
                        populate_health(&mut registry, &health);
                        report.health_collected = true;
                    }
                    Err(e) => log_fetch_error("cluster health", &e),
                }

                tracker.enter(CyclePhase::Exposing);
            }
            Err(e) => {
                log_fetch_error("node stats", &e);
                registry.set_up(false);
                tracker.enter(CyclePhase::Failed);
            }
        }

        let snapshot = registry.snapshot();
        drop(registry);

        report.final_phase = tracker.phase;
        report.duration = started.elapsed();
        debug!(
            up = report.up,
            nodes = report.nodes,
            health = report.health_collected,
            series = snapshot.series_count(),
            duration_ms = report.duration.as_millis() as u64,
            "Collection cycle finished"
        );

        Scrape { snapshot, report }
    }
}

fn log_fetch_error(document: &str, error: &ClientError) {
    if error.is_transport() {
        warn!(document, error = %error, "Error while querying Elasticsearch");
    } else {
        warn!(document, error = %error, "Failed to decode Elasticsearch response");
    }
}
