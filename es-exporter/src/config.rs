//! Exporter configuration.
//!
//! Built once at startup (see [`crate::cli::Args::into_config`]) and shared
//! read-only afterwards.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use es_stats::EsClientConfig;
use url::Url;

use crate::error::{Error, Result};
use crate::metrics::NAMESPACE;

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9108";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_ES_URI: &str = "http://localhost:9200";
pub const DEFAULT_ES_TIMEOUT: &str = "5s";

/// Paths served by other routes.
const RESERVED_PATHS: &[&str] = &["/", "/health"];

/// Immutable exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Upstream connection settings.
    pub es: EsClientConfig,
    /// Address the HTTP server binds to.
    pub listen_address: SocketAddr,
    /// Path serving the exposition.
    pub metrics_path: String,
    /// Prefix of every exported series.
    pub namespace: String,
}

impl ExporterConfig {
    pub fn new(es: EsClientConfig, listen_address: SocketAddr) -> Self {
        Self {
            es,
            listen_address,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            namespace: NAMESPACE.to_string(),
        }
    }

    pub fn with_metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = path.into();
        self
    }

    /// Check cross-field constraints.
    pub fn validate(self) -> Result<Self> {
        validate_metrics_path(&self.metrics_path)?;
        if self.es.timeout.is_zero() {
            return Err(Error::config("es timeout must be greater than zero"));
        }
        Ok(self)
    }
}

pub fn validate_metrics_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::config(format!(
            "telemetry path '{path}' must start with '/'"
        )));
    }
    if RESERVED_PATHS.contains(&path) {
        return Err(Error::config(format!(
            "telemetry path '{path}' collides with a built-in route"
        )));
    }
    // The router would read these as captures or wildcards.
    if path.contains(['{', '}', '*']) || path.split('/').any(|segment| segment.starts_with(':')) {
        return Err(Error::config(format!(
            "telemetry path '{path}' must be a literal path without ':', '{{', '}}' or '*'"
        )));
    }
    Ok(())
}

/// Parse a listen address. `:9108` binds every interface.
pub fn parse_listen_address(value: &str) -> Result<SocketAddr> {
    let value = value.trim();
    let candidate = match value.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => value.to_string(),
    };

    if let Ok(addr) = candidate.parse::<SocketAddr>() {
        return Ok(addr);
    }

    candidate
        .to_socket_addrs()
        .map_err(|e| Error::config(format!("invalid listen address '{value}': {e}")))?
        .next()
        .ok_or_else(|| Error::config(format!("listen address '{value}' did not resolve")))
}

/// Parse the upstream base URI; only http and https are accepted.
pub fn parse_es_uri(value: &str) -> Result<Url> {
    let url = Url::parse(value.trim())
        .map_err(|e| Error::config(format!("invalid es uri '{value}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::config(format!(
            "es uri '{value}' has unsupported scheme '{scheme}'"
        ))),
    }
}

/// Parse a duration such as `5s`, `500ms`, `1.5s` or `2m`. A bare number is seconds.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let number: f64 = number
        .parse()
        .map_err(|_| Error::config(format!("invalid duration '{value}'")))?;
    let seconds = match unit.trim() {
        "ms" => number / 1000.0,
        "" | "s" => number,
        "m" => number * 60.0,
        "h" => number * 3600.0,
        other => {
            return Err(Error::config(format!(
                "unknown duration unit '{other}' in '{value}'"
            )));
        }
    };

    let duration = Duration::try_from_secs_f64(seconds)
        .map_err(|e| Error::config(format!("invalid duration '{value}': {e}")))?;
    if duration.is_zero() {
        return Err(Error::config("duration must be greater than zero"));
    }
    Ok(duration)
}
