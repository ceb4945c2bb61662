//! Protocol error taxonomy.

use std::time::Duration;

use thiserror::Error;
use vellum_crypto::CryptoError;

/// Errors surfaced by credential-protocol operations.
///
/// Outcomes the remote authority distinguishes stay distinguished
/// here; transport problems are classified separately so callers can
/// tell "no such account" from "server unreachable".
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// No such account, or no stored vault. Expected during first
    /// registration; not a transport failure.
    #[error("not found")]
    NotFound,

    /// The authority rejected the verifier or the second-factor code.
    /// Which one was wrong is never disclosed beyond the stage the
    /// caller was in.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration hit an existing username.
    #[error("username already taken")]
    UsernameTaken,

    /// The authority throttled the request.
    #[error("rate limited, retry in {}s", retry_after.as_secs())]
    RateLimited {
        /// Server-provided wait before the next attempt, surfaced
        /// verbatim.
        retry_after: Duration,
    },

    /// The account has a second factor enrolled; the caller must
    /// switch to the second-factor login flow.
    #[error("second factor required")]
    MfaRequired,

    /// A token-authenticated call was made with no session token
    /// installed.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached.
    #[error("server unreachable")]
    ServerUnreachable,

    /// Any other transport-level failure, including malformed
    /// response bodies.
    #[error("network error: {0}")]
    Network(String),

    /// Key derivation failed while computing a verifier.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<reqwest::Error> for ProtocolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProtocolError::Timeout
        } else if err.is_connect() {
            ProtocolError::ServerUnreachable
        } else {
            ProtocolError::Network(err.to_string())
        }
    }
}

/// Convenience alias for fallible protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
