//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use es_stats::EsClientConfig;

use crate::config::{
    DEFAULT_ES_TIMEOUT, DEFAULT_ES_URI, DEFAULT_LISTEN_ADDRESS, DEFAULT_METRICS_PATH,
    ExporterConfig, parse_duration, parse_es_uri, parse_listen_address,
};
use crate::error::Result;
use crate::logging::{LogFormat, LogOptions};

#[derive(Parser, Debug)]
#[command(name = "es-exporter", author, version, about = "Prometheus exporter for Elasticsearch statistics", long_about = None)]
pub struct Args {
    /// Address to listen on for web interface and telemetry
    #[arg(long = "web.listen-address", env = "WEB_LISTEN_ADDRESS", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: String,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", env = "WEB_TELEMETRY_PATH", default_value = DEFAULT_METRICS_PATH)]
    pub metrics_path: String,

    /// HTTP API address of an Elasticsearch node
    #[arg(long = "es.uri", env = "ES_URI", default_value = DEFAULT_ES_URI)]
    pub es_uri: String,

    /// Timeout for trying to get stats from Elasticsearch
    #[arg(long = "es.timeout", env = "ES_TIMEOUT", default_value = DEFAULT_ES_TIMEOUT, value_parser = parse_duration)]
    pub es_timeout: Duration,

    /// Export stats for all nodes in the cluster
    #[arg(long = "es.all", env = "ES_ALL")]
    pub es_all: bool,

    /// Ignore certificate validation errors
    #[arg(long = "es.unsecure", env = "ES_UNSECURE")]
    pub es_unsecure: bool,

    /// Log filter directive (e.g. "es_exporter=debug")
    #[arg(long = "log.level", env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log.format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Also write daily-rotated log files to this directory
    #[arg(long = "log.dir", env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Args {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            filter: self.log_level.clone(),
            format: self.log_format,
            dir: self.log_dir.clone(),
        }
    }

    /// Validate the arguments and build the exporter configuration.
    pub fn into_config(self) -> Result<ExporterConfig> {
        let es = EsClientConfig::new(parse_es_uri(&self.es_uri)?)
            .with_timeout(self.es_timeout)
            .with_all_nodes(self.es_all)
            .with_accept_invalid_certs(self.es_unsecure);
        let listen_address = parse_listen_address(&self.listen_address)?;

        ExporterConfig::new(es, listen_address)
            .with_metrics_path(self.metrics_path)
            .validate()
    }
}
