//! The sealed-vault artifact and its hex wire encoding.

use serde::{Deserialize, Serialize};
use vellum_crypto::{NONCE_SIZE, SALT_SIZE};

use crate::error::{VaultError, VaultResult};

/// An encrypted credential collection.
///
/// This is the only vault artifact that crosses the network or touches
/// durable storage. The remote copy is replaced wholesale on every
/// successful seal; nothing is ever merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedVault {
    /// Salt the vault key was derived under; fresh for every seal.
    pub vault_salt: [u8; SALT_SIZE],
    /// AEAD nonce; fresh for every seal.
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with the 16-byte authentication tag appended.
    pub ciphertext: Vec<u8>,
}

/// Hex wire form of a [`SealedVault`], matching the remote authority's
/// `blob` object. All fields are lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultBlob {
    /// Hex-encoded vault salt (32 hex chars).
    pub vault_salt: String,
    /// Hex-encoded nonce (48 hex chars).
    pub nonce: String,
    /// Hex-encoded ciphertext, tag included.
    pub ciphertext: String,
}

impl SealedVault {
    /// Encode for the wire.
    pub fn to_blob(&self) -> VaultBlob {
        VaultBlob {
            vault_salt: hex::encode(self.vault_salt),
            nonce: hex::encode(self.nonce),
            ciphertext: hex::encode(&self.ciphertext),
        }
    }

    /// Decode a wire blob, validating structure only. Whether the
    /// ciphertext authenticates is the cipher's business, not this
    /// function's.
    pub fn from_blob(blob: &VaultBlob) -> VaultResult<Self> {
        let vault_salt = decode_fixed::<SALT_SIZE>("vault_salt", &blob.vault_salt)?;
        let nonce = decode_fixed::<NONCE_SIZE>("nonce", &blob.nonce)?;
        let ciphertext = hex::decode(&blob.ciphertext)
            .map_err(|_| VaultError::InvalidBlob("ciphertext is not valid hex".into()))?;

        Ok(Self {
            vault_salt,
            nonce,
            ciphertext,
        })
    }
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> VaultResult<[u8; N]> {
    let bytes = hex::decode(value)
        .map_err(|_| VaultError::InvalidBlob(format!("{field} is not valid hex")))?;
    bytes
        .try_into()
        .map_err(|_| VaultError::InvalidBlob(format!("{field} must be {N} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_crypto::generate_random_bytes;

    fn sample() -> SealedVault {
        SealedVault {
            vault_salt: generate_random_bytes(),
            nonce: generate_random_bytes(),
            ciphertext: vec![0xAB; 48],
        }
    }

    #[test]
    fn test_blob_roundtrip() {
        let sealed = sample();
        let blob = sealed.to_blob();

        assert_eq!(blob.vault_salt.len(), SALT_SIZE * 2);
        assert_eq!(blob.nonce.len(), NONCE_SIZE * 2);
        assert_eq!(SealedVault::from_blob(&blob).unwrap(), sealed);
    }

    #[test]
    fn test_blob_is_lowercase_hex() {
        let blob = sample().to_blob();
        assert_eq!(blob.ciphertext, blob.ciphertext.to_lowercase());
        assert!(blob.ciphertext.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_rejects_wrong_salt_length() {
        let mut blob = sample().to_blob();
        blob.vault_salt = "abcd".into();

        let err = SealedVault::from_blob(&blob).unwrap_err();
        assert!(matches!(err, VaultError::InvalidBlob(_)));
    }

    #[test]
    fn test_rejects_non_hex() {
        let mut blob = sample().to_blob();
        blob.nonce = "zz".repeat(NONCE_SIZE);

        let err = SealedVault::from_blob(&blob).unwrap_err();
        assert!(matches!(err, VaultError::InvalidBlob(_)));
    }
}
