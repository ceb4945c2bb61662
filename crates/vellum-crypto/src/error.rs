//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors produced by key derivation and authenticated encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Input failed validation before any cryptographic work started.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The key-derivation function failed internally.
    #[error("key derivation failed")]
    DerivationFailure,

    /// Encryption failed.
    #[error("encryption failed")]
    EncryptionFailure,

    /// Decryption failed: wrong key or corrupted ciphertext. The two
    /// cases are deliberately indistinguishable.
    #[error("decryption failed")]
    DecryptionFailure,
}

/// Convenience alias for fallible crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
