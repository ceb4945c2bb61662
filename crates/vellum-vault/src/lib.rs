//! # vellum-vault
//!
//! The sealed credential vault: the in-memory collection model, the
//! seal/unseal cipher over it, and the hex wire format the sync
//! service stores.
//!
//! A vault key is derived fresh from the user secret for every seal,
//! under a salt that never leaves this artifact. The remote authority
//! only ever sees `{vault_salt, nonce, ciphertext}` and can neither
//! read nor undetectably modify the contents.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cipher;
pub mod collection;
pub mod entry;
pub mod error;
pub mod sealed;

pub use cipher::{seal, unseal};
pub use collection::CredentialCollection;
pub use entry::{CredentialRecord, StoredEntry};
pub use error::{VaultError, VaultResult};
pub use sealed::{SealedVault, VaultBlob};
