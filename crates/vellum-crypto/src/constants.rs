//! Cryptographic constants shared across the Vellum core.
//!
//! All constants are normative: the sealed-vault format and the
//! verifier exchange both depend on them, so changing any of these
//! breaks compatibility with existing accounts and vaults.

/// Size of key-derivation salts in bytes (auth salt and vault salt)
pub const SALT_SIZE: usize = 16;

/// Size of derived symmetric keys and verifiers in bytes
pub const KEY_SIZE: usize = 32;

/// Size of XChaCha20-Poly1305 nonces in bytes (192 bits)
pub const NONCE_SIZE: usize = 24;

/// Size of XChaCha20-Poly1305 authentication tags in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Argon2id parameters for key derivation
pub mod argon2_params {
    use argon2::{Params, Version};

    /// Memory cost: 128 MiB
    pub const MEMORY_COST: u32 = 128 * 1024;

    /// Time cost: 3 iterations
    pub const TIME_COST: u32 = 3;

    /// Parallelism: 4 threads
    pub const PARALLELISM: u32 = 4;

    /// Output length: 32 bytes
    pub const OUTPUT_LENGTH: usize = 32;

    /// Get Argon2id parameters
    pub fn get_params() -> Params {
        Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LENGTH))
            .expect("valid Argon2id parameters")
    }

    /// Argon2 version
    pub const VERSION: Version = Version::V0x13;
}
