use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{url} returned http {status}")]
    Status { url: String, status: u16 },
    #[error("json error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// True for failures that happened before a body could be decoded.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ClientError::Decode(_))
    }

    pub(crate) fn from_reqwest(url: &str, timeout: Duration, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else {
            ClientError::Transport(error)
        }
    }
}
