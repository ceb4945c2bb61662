//! Session error taxonomy.

use std::time::Duration;

use thiserror::Error;
use vellum_protocol::ProtocolError;
use vellum_vault::VaultError;

/// Errors surfaced by session operations.
///
/// Protocol outcomes that callers branch on keep their own variants
/// here; everything else tunnels through unchanged. A wrong secret
/// and an undecryptable vault are reported identically, as
/// [`InvalidCredentials`](Self::InvalidCredentials).
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session exists; sign in first.
    #[error("not signed in")]
    NotSignedIn,

    /// The session is already established.
    #[error("already signed in")]
    AlreadySignedIn,

    /// The operation needs an unlocked session.
    #[error("vault is locked")]
    VaultLocked,

    /// An unlock already progressed to the second-factor step; cancel
    /// it or submit a code.
    #[error("second-factor challenge in progress")]
    SecondFactorPending,

    /// There is no second-factor challenge to answer or cancel.
    #[error("no second-factor challenge in progress")]
    NoPendingChallenge,

    /// The secret or code was refused, or the vault would not unseal.
    /// Which of those happened is never disclosed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration hit an existing username.
    #[error("username already taken")]
    UsernameTaken,

    /// No such account.
    #[error("account not found")]
    NotFound,

    /// The remote authority throttled the attempt; wait before
    /// retrying.
    #[error("rate limited, retry in {}s", retry_after.as_secs())]
    RateLimited {
        /// Server-provided wait, surfaced verbatim.
        retry_after: Duration,
    },

    /// Any other protocol failure, transport problems included.
    #[error(transparent)]
    Protocol(ProtocolError),

    /// Sealing or unsealing failed for a reason other than a refused
    /// secret.
    #[error(transparent)]
    Vault(#[from] VaultError),
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidCredentials => SessionError::InvalidCredentials,
            ProtocolError::UsernameTaken => SessionError::UsernameTaken,
            ProtocolError::NotFound => SessionError::NotFound,
            ProtocolError::RateLimited { retry_after } => SessionError::RateLimited { retry_after },
            other => SessionError::Protocol(other),
        }
    }
}

/// Convenience alias for fallible session operations.
pub type SessionResult<T> = Result<T, SessionError>;
