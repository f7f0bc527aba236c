use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use es_exporter::api::{ApiServer, AppState, shutdown_on_signal};
use es_exporter::cli::Args;
use es_exporter::logging::init_logging;
use es_exporter::metrics::{Catalog, Collector, PrometheusExporter};
use es_stats::EsClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let _guard = init_logging(&args.log_options()).context("Failed to initialize logging")?;

    let config = args.into_config().context("Invalid configuration")?;

    let catalog = Arc::new(Catalog::new().context("Metric catalog is invalid")?);
    let client = EsClient::new(&config.es).context("Failed to create Elasticsearch client")?;

    tracing::info!(
        uri = %client.node_stats_url(),
        all_nodes = config.es.all_nodes,
        timeout_ms = config.es.timeout.as_millis() as u64,
        metrics = catalog.len(),
        "Starting es-exporter {}",
        env!("CARGO_PKG_VERSION")
    );

    let collector = Arc::new(Collector::new(Arc::new(client), catalog));
    let exporter = Arc::new(PrometheusExporter::with_namespace(
        collector,
        config.namespace.clone(),
    ));

    let server = ApiServer::new(
        config.listen_address,
        AppState::new(exporter, config.metrics_path.clone()),
    );
    tokio::spawn(shutdown_on_signal(server.cancel_token()));

    server
        .run()
        .await
        .with_context(|| format!("Failed to serve on {}", config.listen_address))?;

    tracing::info!("es-exporter stopped");
    Ok(())
}
