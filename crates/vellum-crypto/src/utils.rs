//! Common utility functions for Vellum cryptographic operations.

use rand::RngCore;

/// Generate cryptographically secure random bytes.
///
/// Uses the system's CSPRNG to fill a fixed-size array with random bytes.
///
/// # Example
///
/// ```
/// use vellum_crypto::generate_random_bytes;
///
/// let nonce: [u8; 24] = generate_random_bytes();
/// let salt: [u8; 16] = generate_random_bytes();
/// ```
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}
