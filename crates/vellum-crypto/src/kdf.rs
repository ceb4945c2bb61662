//! Symmetric key derivation from a human secret using Argon2id.

use argon2::{Algorithm, Argon2};

use crate::constants::{argon2_params, KEY_SIZE, SALT_SIZE};
use crate::error::{CryptoError, CryptoResult};

/// Derive a 32-byte symmetric key from a secret and a 16-byte salt.
///
/// Argon2id with fixed costs (3 iterations, 128 MiB memory, 4 lanes),
/// so identical (secret, salt) pairs always yield identical keys. The
/// authentication verifier and the vault key both come from the same
/// secret under independent salts; callers must never reuse one salt
/// for both purposes, or a verifier leak would expose the vault key.
///
/// Fails only on a malformed salt; every 16-byte salt is acceptable.
pub fn derive_key(secret: &[u8], salt: &[u8]) -> CryptoResult<[u8; KEY_SIZE]> {
    if salt.len() != SALT_SIZE {
        return Err(CryptoError::InvalidInput(format!(
            "salt must be {} bytes, got {}",
            SALT_SIZE,
            salt.len()
        )));
    }

    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        argon2_params::VERSION,
        argon2_params::get_params(),
    );

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(secret, salt, &mut key)
        .map_err(|_| CryptoError::DerivationFailure)?;

    Ok(key)
}
