#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("cannot reach {provider} at {url}: {message}")]
    Connection {
        provider: &'static str,
        url: String,
        message: String,
    },

    #[error("{provider} rejected the request (status {status}): {body}")]
    Rejected {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// `secs` is known when the client's own deadline fired; a transport
    /// timeout inside the HTTP client does not report it.
    #[error("{provider} did not answer in time{}", .secs.map_or_else(String::new, |s| format!(" (limit {s}s)")))]
    Timeout {
        provider: &'static str,
        secs: Option<u64>,
    },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("HTTP client construction failed: {0}")]
    Client(String),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl EmbedError {
    /// Classify a transport-level `reqwest` failure.
    pub(crate) fn transport(provider: &'static str, url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::debug!(provider, url, "transport timeout");
            return Self::Timeout {
                provider,
                secs: None,
            };
        }
        if err.is_connect() || err.is_request() {
            return Self::Connection {
                provider,
                url: url.to_owned(),
                message: err.to_string(),
            };
        }
        Self::Other(format!("{provider} request failed: {err}"))
    }

    /// Configuration errors that substituting a vector would only hide.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. } | Self::Client(_))
    }
}

pub type Result<T> = std::result::Result<T, EmbedError>;
