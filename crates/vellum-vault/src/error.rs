//! Error types for vault sealing and unsealing.

use thiserror::Error;
use vellum_crypto::CryptoError;

/// Errors produced by the vault layer.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The vault could not be opened: wrong secret or corrupted data.
    /// The two causes are deliberately indistinguishable; callers
    /// present this as "wrong password".
    #[error("vault decryption failed")]
    DecryptionFailure,

    /// The collection could not be serialized for sealing.
    #[error("vault serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A wire blob failed structural validation before any
    /// cryptography ran.
    #[error("invalid vault blob: {0}")]
    InvalidBlob(String),

    /// Key derivation or encryption failed while sealing.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Convenience alias for fallible vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
