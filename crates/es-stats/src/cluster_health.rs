//! `/_cluster/health` response model.

use std::fmt;

use serde::Deserialize;

/// Cluster health summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterHealthResponse {
    #[serde(default)]
    pub cluster_name: String,
    /// Raw status string as reported by the server.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub number_of_nodes: u64,
    #[serde(default)]
    pub number_of_data_nodes: u64,
}

impl ClusterHealthResponse {
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_lossy(&self.status)
    }
}

/// Cluster health colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStatus {
    #[default]
    Green,
    Yellow,
    Red,
    /// Anything the server reports that is not one of the known colours.
    Other,
}

impl HealthStatus {
    /// Parse a status string, mapping unknown values to [`HealthStatus::Other`].
    pub fn from_lossy(status: &str) -> Self {
        match status {
            "green" => HealthStatus::Green,
            "yellow" => HealthStatus::Yellow,
            "red" => HealthStatus::Red,
            _ => HealthStatus::Other,
        }
    }

    /// Numeric encoding used for the health gauge.
    ///
    /// Unrecognized statuses report as green (0).
    pub fn ordinal(self) -> u8 {
        match self {
            HealthStatus::Green | HealthStatus::Other => 0,
            HealthStatus::Yellow => 1,
            HealthStatus::Red => 2,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Green => write!(f, "green"),
            HealthStatus::Yellow => write!(f, "yellow"),
            HealthStatus::Red => write!(f, "red"),
            HealthStatus::Other => write!(f, "other"),
        }
    }
}
