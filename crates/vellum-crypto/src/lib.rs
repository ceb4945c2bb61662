//! # vellum-crypto
//!
//! Cryptographic primitives for the Vellum password-manager core:
//! Argon2id key derivation and XChaCha20-Poly1305 authenticated
//! encryption, plus the size constants and random helpers shared by the
//! higher layers.
//!
//! Everything here is synchronous and free of I/O. Key derivation is
//! deliberately expensive (128 MiB working set per call); async callers
//! run it on a blocking worker, never inline on a reactor thread.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cipher;
pub mod constants;
pub mod error;
pub mod kdf;
pub mod utils;

pub use cipher::{decrypt, encrypt};
pub use constants::*;
pub use error::{CryptoError, CryptoResult};
pub use kdf::derive_key;
pub use utils::generate_random_bytes;
