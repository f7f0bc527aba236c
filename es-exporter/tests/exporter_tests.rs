//! End-to-end tests of the collection cycle, exposition and HTTP routes.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use es_exporter::api::{AppState, router};
use es_exporter::metrics::{
    CONTENT_TYPE, Catalog, Collector, CyclePhase, Metric, PrometheusExporter, render,
};
use es_stats::{
    ClientError, ClusterHealthResponse, EsClient, EsClientConfig, NodeStatsResponse, StatsSource,
};
use rstest::rstest;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;
use url::Url;

const NODE_STATS: &str = include_str!("../../crates/es-stats/tests/fixtures/node_stats.json");
const CLUSTER_HEALTH: &str = include_str!("../../crates/es-stats/tests/fixtures/cluster_health.json");

const UP_ONLY: &str = "# HELP elasticsearch_up Was the Elasticsearch instance query successful?\n\
                       # TYPE elasticsearch_up gauge\n\
                       elasticsearch_up 0\n";

fn node_stats() -> NodeStatsResponse {
    serde_json::from_str(NODE_STATS).unwrap()
}

fn cluster_health() -> ClusterHealthResponse {
    serde_json::from_str(CLUSTER_HEALTH).unwrap()
}

fn decode_error() -> ClientError {
    ClientError::Decode(serde_json::from_str::<serde_json::Value>("{\"nodes\":").unwrap_err())
}

fn unavailable() -> ClientError {
    ClientError::Status {
        url: "http://localhost:9200/_cluster/health".to_string(),
        status: 503,
    }
}

enum Reply<T> {
    Ok(T),
    Err(fn() -> ClientError),
}

/// Scripted stats source. Queued replies are consumed one per fetch; once a
/// queue is empty the fixture documents are served.
#[derive(Default)]
struct FixtureSource {
    node_replies: Mutex<VecDeque<Reply<NodeStatsResponse>>>,
    health_replies: Mutex<VecDeque<Reply<ClusterHealthResponse>>>,
    node_fetches: AtomicUsize,
    health_fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
    all_nodes: bool,
}

impl FixtureSource {
    fn new() -> Self {
        Self {
            all_nodes: true,
            ..Default::default()
        }
    }

    fn local() -> Self {
        Self::default()
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push_nodes(&self, reply: Reply<NodeStatsResponse>) {
        self.node_replies.lock().unwrap().push_back(reply);
    }

    fn push_health(&self, reply: Reply<ClusterHealthResponse>) {
        self.health_replies.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl StatsSource for FixtureSource {
    async fn node_stats(&self) -> es_stats::Result<NodeStatsResponse> {
        let seq = self.node_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self.node_replies.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Some(Reply::Ok(stats)) => Ok(stats),
            Some(Reply::Err(make)) => Err(make()),
            None => {
                // Stamp the fetch sequence so each cycle is distinguishable.
                let mut stats = node_stats();
                for node in stats.nodes.values_mut() {
                    node.indices.docs.count = seq as i64;
                }
                Ok(stats)
            }
        }
    }

    async fn cluster_health(&self) -> es_stats::Result<ClusterHealthResponse> {
        let seq = self.health_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let reply = self.health_replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Ok(health)) => Ok(health),
            Some(Reply::Err(make)) => Err(make()),
            None => {
                let mut health = cluster_health();
                health.number_of_nodes = seq as u64;
                Ok(health)
            }
        }
    }

    fn all_nodes(&self) -> bool {
        self.all_nodes
    }
}

/// Log sink for asserting on emitted events.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_warnings() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

fn collector(source: Arc<FixtureSource>) -> Arc<Collector> {
    Arc::new(Collector::new(source, Arc::new(Catalog::new().unwrap())))
}

fn exporter(source: Arc<FixtureSource>) -> Arc<PrometheusExporter> {
    Arc::new(PrometheusExporter::new(collector(source)))
}

#[tokio::test]
async fn test_full_cycle_exposes_nodes_and_health() {
    let source = Arc::new(FixtureSource::new());
    let scrape = collector(source.clone()).collect().await;

    assert!(scrape.report.up);
    assert!(scrape.report.health_collected);
    assert_eq!(scrape.report.nodes, 2);
    assert_eq!(scrape.report.final_phase, CyclePhase::Exposing);

    let snapshot = &scrape.snapshot;
    assert!(snapshot.up);
    assert_eq!(
        snapshot.nodes().collect::<Vec<_>>(),
        vec!["10.0.0.1", "10.0.0.2", "unknown"]
    );
    assert_eq!(
        snapshot.value(Metric::JvmGcCollectionTime, &["elasticsearch", "10.0.0.1", "old"]),
        Some(2.5)
    );
    assert_eq!(
        snapshot.value(Metric::ProcessCpuTime, &["elasticsearch", "10.0.0.1", "total"]),
        Some(123.45)
    );
    assert_eq!(
        snapshot.value(Metric::ThreadPoolQueue, &["elasticsearch", "10.0.0.1", "search"]),
        Some(2.0)
    );
    assert_eq!(
        snapshot.value(Metric::ClusterNumberOfDataNodes, &["elasticsearch", "unknown"]),
        Some(2.0)
    );

    let output = render("elasticsearch", snapshot);
    assert!(output.contains(
        "elasticsearch_jvm_gc_collection_seconds_sum{cluster=\"elasticsearch\",node=\"10.0.0.1\",gc=\"old\"} 2.5\n"
    ));
    assert!(output.ends_with("elasticsearch_up 1\n"));
}

#[tokio::test]
async fn test_unmeasured_process_stats_keep_cluster_up() {
    let stats: NodeStatsResponse = serde_json::from_str(
        r#"{"cluster_name":"c","nodes":{"n1":{"host":"h","process":{
            "cpu":{"percent":3,"total_in_millis":-1,"sys_in_millis":-1,"user_in_millis":-1},
            "mem":{"resident_in_bytes":4096,"share_in_bytes":-1,"total_virtual_in_bytes":-1},
            "open_file_descriptors":-1,"max_file_descriptors":-1}}}}"#,
    )
    .unwrap();
    let source = Arc::new(FixtureSource::new());
    source.push_nodes(Reply::Ok(stats));

    let scrape = collector(source).collect().await;
    assert!(scrape.report.up);

    let snapshot = &scrape.snapshot;
    assert_eq!(snapshot.value(Metric::ProcessCpuPercent, &["c", "h"]), Some(3.0));
    assert_eq!(snapshot.value(Metric::ProcessMemResident, &["c", "h"]), Some(4096.0));
    assert_eq!(snapshot.value(Metric::ProcessMemVirtual, &["c", "h"]), Some(-1.0));
    assert_eq!(snapshot.value(Metric::ProcessMaxFiles, &["c", "h"]), Some(-1.0));
    assert_eq!(
        snapshot.value(Metric::ProcessCpuTime, &["c", "h", "total"]),
        Some(-0.001)
    );
    assert!(render("elasticsearch", snapshot).ends_with("elasticsearch_up 1\n"));
}

#[tokio::test]
async fn test_local_mode_with_several_nodes_still_exports() {
    let (logs, _guard) = capture_warnings();
    let source = Arc::new(FixtureSource::local());

    let scrape = collector(source).collect().await;
    assert!(scrape.report.up);
    assert_eq!(scrape.report.nodes, 2);
    assert_eq!(
        scrape.snapshot.nodes().collect::<Vec<_>>(),
        vec!["10.0.0.1", "10.0.0.2", "unknown"]
    );
    assert!(
        scrape
            .snapshot
            .value(Metric::IndicesDocs, &["elasticsearch", "10.0.0.2"])
            .is_some()
    );

    let output = logs.contents();
    assert!(output.contains("Unexpected number of nodes returned for local node stats"));
    assert!(output.contains("nodes=2"));
}

#[tokio::test]
async fn test_local_mode_with_one_node_is_quiet() {
    let (logs, _guard) = capture_warnings();
    let source = Arc::new(FixtureSource::local());
    let mut single = node_stats();
    single.nodes.retain(|_, node| node.host == "10.0.0.1");
    source.push_nodes(Reply::Ok(single));

    let scrape = collector(source).collect().await;
    assert!(scrape.report.up);
    assert_eq!(scrape.report.nodes, 1);
    assert!(!logs.contents().contains("Unexpected number of nodes"));
}

#[tokio::test]
async fn test_departed_node_series_are_removed() {
    let source = Arc::new(FixtureSource::new());
    let collector = collector(source.clone());

    let first = collector.collect().await;
    assert!(first.snapshot.nodes().any(|n| n == "10.0.0.2"));

    let mut shrunk = node_stats();
    shrunk.nodes.retain(|_, node| node.host != "10.0.0.2");
    source.push_nodes(Reply::Ok(shrunk));

    let second = collector.collect().await;
    assert!(second.snapshot.up);
    assert_eq!(second.report.nodes, 1);
    assert!(!second.snapshot.nodes().any(|n| n == "10.0.0.2"));

    let output = render("elasticsearch", &second.snapshot);
    assert!(!output.contains("10.0.0.2"));
    assert!(output.contains("node=\"10.0.0.1\""));
}

#[tokio::test]
async fn test_unchanged_upstream_renders_identically() {
    let source = Arc::new(FixtureSource::new());
    for _ in 0..2 {
        source.push_nodes(Reply::Ok(node_stats()));
        source.push_health(Reply::Ok(cluster_health()));
    }
    let exporter = exporter(source);

    let first = exporter.export().await;
    let second = exporter.export().await;
    assert_eq!(first, second);
}

#[rstest]
#[case("green", 0.0)]
#[case("yellow", 1.0)]
#[case("red", 2.0)]
#[case("purple", 0.0)]
#[tokio::test]
async fn test_health_status_ordinal(#[case] status: &str, #[case] expected: f64) {
    let source = Arc::new(FixtureSource::new());
    source.push_health(Reply::Ok(ClusterHealthResponse {
        status: status.to_string(),
        ..cluster_health()
    }));

    let scrape = collector(source).collect().await;
    assert_eq!(
        scrape
            .snapshot
            .value(Metric::ClusterHealthStatus, &["elasticsearch", "unknown"]),
        Some(expected)
    );
}

#[tokio::test]
async fn test_node_stats_decode_failure_reports_down() {
    let source = Arc::new(FixtureSource::new());
    let exporter = exporter(source.clone());

    // A healthy cycle first, so there is something that must not leak.
    assert!(exporter.export().await.ends_with("elasticsearch_up 1\n"));

    source.push_nodes(Reply::Err(decode_error));
    let output = exporter.export().await;
    assert_eq!(output, UP_ONLY);
    // Health is not queried once node stats failed.
    assert_eq!(source.health_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_node_stats_timeout_reports_down() {
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = EsClientConfig::new(Url::parse(&format!("http://{addr}")).unwrap())
        .with_timeout(Duration::from_millis(100))
        .with_all_nodes(true);
    let client = EsClient::new(&config).unwrap();
    let collector = Arc::new(Collector::new(
        Arc::new(client),
        Arc::new(Catalog::new().unwrap()),
    ));

    let scrape = tokio::time::timeout(Duration::from_secs(5), collector.collect())
        .await
        .expect("cycle must be bounded by the client timeout");

    assert!(!scrape.report.up);
    assert_eq!(scrape.report.final_phase, CyclePhase::Failed);
    assert_eq!(render("elasticsearch", &scrape.snapshot), UP_ONLY);
}

#[tokio::test]
async fn test_health_failure_keeps_node_series() {
    let source = Arc::new(FixtureSource::new());
    source.push_health(Reply::Err(unavailable));

    let scrape = collector(source).collect().await;
    assert!(scrape.report.up);
    assert!(!scrape.report.health_collected);
    assert_eq!(scrape.report.final_phase, CyclePhase::Exposing);

    let output = render("elasticsearch", &scrape.snapshot);
    assert!(output.contains("elasticsearch_indices_docs{cluster=\"elasticsearch\",node=\"10.0.0.1\"}"));
    assert!(!output.contains("elasticsearch_cluster_health_status"));
    assert!(!output.contains("elasticsearch_cluster_number_of_nodes_total"));
    assert!(output.ends_with("elasticsearch_up 1\n"));
}

#[tokio::test]
async fn test_concurrent_scrapes_are_serialized() {
    let source = Arc::new(FixtureSource::new().with_delay(Duration::from_millis(20)));
    let collector = collector(source.clone());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let collector = collector.clone();
            tokio::spawn(async move { collector.collect().await })
        })
        .collect();

    let mut cycles = Vec::new();
    for handle in handles {
        let scrape = handle.await.unwrap();
        let snapshot = &scrape.snapshot;

        // Node stats and health of one scrape come from the same cycle.
        let docs = snapshot
            .value(Metric::IndicesDocs, &["elasticsearch", "10.0.0.1"])
            .unwrap();
        let health_nodes = snapshot
            .value(Metric::ClusterNumberOfNodes, &["elasticsearch", "unknown"])
            .unwrap();
        assert_eq!(docs, health_nodes);
        assert_eq!(
            snapshot.value(Metric::IndicesDocs, &["elasticsearch", "10.0.0.2"]),
            Some(docs)
        );
        cycles.push(docs as usize);
    }

    cycles.sort_unstable();
    assert_eq!(cycles, (1..=8).collect::<Vec<_>>());
    assert_eq!(source.node_fetches.load(Ordering::SeqCst), 8);
    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_metrics_route() {
    let source = Arc::new(FixtureSource::new());
    let app = router(AppState::new(exporter(source.clone()), "/metrics"));

    let (status, content_type, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(CONTENT_TYPE));
    assert!(body.contains("# TYPE elasticsearch_indices_docs gauge\n"));
    assert!(body.ends_with("elasticsearch_up 1\n"));
    assert_eq!(source.node_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_metrics_route_when_upstream_is_down() {
    let source = Arc::new(FixtureSource::new());
    source.push_nodes(Reply::Err(unavailable));
    let app = router(AppState::new(exporter(source), "/metrics"));

    let (status, _, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, UP_ONLY);
}

#[tokio::test]
async fn test_custom_metrics_path_and_landing_page() {
    let source = Arc::new(FixtureSource::new());
    let app = router(AppState::new(exporter(source.clone()), "/probe"));

    let (status, _, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<a href='/probe'>Metrics</a>"));

    let (status, _, _) = get(app.clone(), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = get(app, "/probe").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("elasticsearch_up 1"));
    // The landing page does not trigger a cycle.
    assert_eq!(source.node_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_health_route_does_not_touch_upstream() {
    let source = Arc::new(FixtureSource::new());
    let app = router(AppState::new(exporter(source.clone()), "/metrics"));

    let (status, _, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "alive");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_secs"].is_u64());
    assert_eq!(source.node_fetches.load(Ordering::SeqCst), 0);
}
