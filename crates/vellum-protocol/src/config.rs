//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default whole-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection-establishment timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to reach the remote authority.
///
/// Passed explicitly to [`HttpAuthority::new`](crate::HttpAuthority::new);
/// nothing here lives in global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the authority, e.g. `https://vault.example.com`.
    pub base_url: String,

    /// Whole-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Connection-establishment timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Configuration with default timeouts for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

fn default_request_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    CONNECT_TIMEOUT
}
