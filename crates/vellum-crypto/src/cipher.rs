//! XChaCha20-Poly1305 authenticated encryption.
//!
//! The 192-bit nonce space is what lets the vault layer draw a fresh
//! random nonce for every seal without tracking nonce state.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

use crate::constants::{KEY_SIZE, NONCE_SIZE};
use crate::error::{CryptoError, CryptoResult};

/// Encrypt `plaintext`, returning the ciphertext with the 16-byte
/// Poly1305 tag appended.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(XNonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailure)
}

/// Decrypt a ciphertext-plus-tag buffer produced by [`encrypt`].
///
/// Fails with the opaque [`CryptoError::DecryptionFailure`] on any tag
/// mismatch; a wrong key, a truncated buffer, and a flipped bit all
/// look the same to the caller.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TAG_SIZE;
    use crate::utils::generate_random_bytes;

    #[test]
    fn test_encrypt_appends_tag() {
        let key: [u8; KEY_SIZE] = generate_random_bytes();
        let nonce: [u8; NONCE_SIZE] = generate_random_bytes();

        let ciphertext = encrypt(&key, &nonce, b"payload").unwrap();
        assert_eq!(ciphertext.len(), b"payload".len() + TAG_SIZE);
    }

    #[test]
    fn test_roundtrip() {
        let key: [u8; KEY_SIZE] = generate_random_bytes();
        let nonce: [u8; NONCE_SIZE] = generate_random_bytes();

        let ciphertext = encrypt(&key, &nonce, b"attack at dawn").unwrap();
        let plaintext = decrypt(&key, &nonce, &ciphertext).unwrap();
        assert_eq!(plaintext, b"attack at dawn");
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let key: [u8; KEY_SIZE] = generate_random_bytes();
        let other_key: [u8; KEY_SIZE] = generate_random_bytes();
        let nonce: [u8; NONCE_SIZE] = generate_random_bytes();

        let ciphertext = encrypt(&key, &nonce, b"attack at dawn").unwrap();
        let err = decrypt(&other_key, &nonce, &ciphertext).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailure));
    }

    #[test]
    fn test_tampered_ciphertext_fails_closed() {
        let key: [u8; KEY_SIZE] = generate_random_bytes();
        let nonce: [u8; NONCE_SIZE] = generate_random_bytes();

        let mut ciphertext = encrypt(&key, &nonce, b"attack at dawn").unwrap();
        ciphertext[3] ^= 0x01;
        let err = decrypt(&key, &nonce, &ciphertext).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailure));
    }

    #[test]
    fn test_truncated_ciphertext_fails_closed() {
        let key: [u8; KEY_SIZE] = generate_random_bytes();
        let nonce: [u8; NONCE_SIZE] = generate_random_bytes();

        let err = decrypt(&key, &nonce, &[0u8; 5]).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailure));
    }
}
