//! HTTP client for the statistics endpoints.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::cluster_health::ClusterHealthResponse;
use crate::error::{ClientError, Result};
use crate::node_stats::NodeStatsResponse;
use crate::source::StatsSource;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!("es-stats/", env!("CARGO_PKG_VERSION"));

const ALL_NODES_PATH: &str = "/_nodes/stats";
const LOCAL_NODE_PATH: &str = "/_nodes/_local/stats";
const CLUSTER_HEALTH_PATH: &str = "/_cluster/health";

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Connection settings for [`EsClient`].
#[derive(Debug, Clone)]
pub struct EsClientConfig {
    /// Base URI of the HTTP API, e.g. `http://localhost:9200`.
    ///
    /// User info in the URI is sent as basic auth.
    pub base_uri: Url,
    /// Bounds both connecting and the whole request.
    pub timeout: Duration,
    /// Query `/_nodes/stats` instead of `/_nodes/_local/stats`.
    pub all_nodes: bool,
    /// Skip TLS certificate validation.
    pub accept_invalid_certs: bool,
}

impl EsClientConfig {
    pub fn new(base_uri: Url) -> Self {
        Self {
            base_uri,
            timeout: DEFAULT_TIMEOUT,
            all_nodes: false,
            accept_invalid_certs: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_all_nodes(mut self, all_nodes: bool) -> Self {
        self.all_nodes = all_nodes;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

#[derive(Debug, Clone)]
struct BasicAuth {
    username: String,
    password: Option<String>,
}

/// Fetches statistics documents over HTTP.
#[derive(Debug, Clone)]
pub struct EsClient {
    http: reqwest::Client,
    node_stats_url: Url,
    cluster_health_url: Url,
    auth: Option<BasicAuth>,
    timeout: Duration,
    all_nodes: bool,
}

impl EsClient {
    pub fn new(config: &EsClientConfig) -> Result<Self> {
        install_rustls_provider();

        let mut base = config.base_uri.clone();
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUri(format!(
                "unsupported scheme '{}' in {}",
                base.scheme(),
                base
            )));
        }

        let auth = if base.username().is_empty() {
            None
        } else {
            let auth = BasicAuth {
                username: base.username().to_string(),
                password: base.password().map(str::to_string),
            };
            // Keep credentials out of logged and error-reported URLs.
            let _ = base.set_username("");
            let _ = base.set_password(None);
            Some(auth)
        };

        let node_path = if config.all_nodes {
            ALL_NODES_PATH
        } else {
            LOCAL_NODE_PATH
        };
        let node_stats_url = endpoint(&base, node_path)?;
        let cluster_health_url = endpoint(&base, CLUSTER_HEALTH_PATH)?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            node_stats_url,
            cluster_health_url,
            auth,
            timeout: config.timeout,
            all_nodes: config.all_nodes,
        })
    }

    pub fn node_stats_url(&self) -> &Url {
        &self.node_stats_url
    }

    pub fn cluster_health_url(&self) -> &Url {
        &self.cluster_health_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        trace!(url = %url, "GET");

        let mut request = self.http.get(url.clone());
        if let Some(auth) = &self.auth {
            request = request.basic_auth(&auth.username, auth.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(url.as_str(), self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(url.as_str(), self.timeout, e))?;
        debug!(url = %url, bytes = body.len(), "Fetched stats document");

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl StatsSource for EsClient {
    async fn node_stats(&self) -> Result<NodeStatsResponse> {
        self.get_json(&self.node_stats_url).await
    }

    async fn cluster_health(&self) -> Result<ClusterHealthResponse> {
        self.get_json(&self.cluster_health_url).await
    }

    fn all_nodes(&self) -> bool {
        self.all_nodes
    }
}

/// Append `path` to the base URI, keeping any path prefix the base carries.
fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| ClientError::InvalidUri(format!("{joined}: {e}")))
}
