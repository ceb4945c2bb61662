//! Session controller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default idle window before the session locks.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default number of audit entries retained in memory.
pub const DEFAULT_AUDIT_CAPACITY: usize = 256;

/// Tunables for [`SessionController`](crate::SessionController).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long the session may sit idle before locking.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: Duration,

    /// Oldest audit entries are dropped beyond this count.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

fn default_idle_timeout() -> Duration {
    DEFAULT_IDLE_TIMEOUT
}

fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}
