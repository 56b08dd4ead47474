//! Shared HTTP client construction for embedding backends.

use std::time::Duration;

use crate::error::{EmbedError, Result};

/// Build the HTTP client used by every remote embedding backend.
///
/// Config: 10s connect timeout, `request_timeout` overall, rustls TLS,
/// `vox/{version}` user-agent, redirect limit 5.
///
/// # Errors
///
/// Returns [`EmbedError::Client`] if the TLS backend cannot be initialised.
pub fn default_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(request_timeout)
        .user_agent(concat!("vox/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| EmbedError::Client(e.to_string()))
}

/// Strip trailing slashes so endpoint paths can be appended with `format!`.
pub(crate) fn trim_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_builds() {
        assert!(default_client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn trim_removes_all_trailing_slashes() {
        assert_eq!(
            trim_base_url("http://localhost:11434//".into()),
            "http://localhost:11434"
        );
        assert_eq!(trim_base_url("http://h".into()), "http://h");
    }
}
