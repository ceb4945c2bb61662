//! Sealing and unsealing the credential collection.

use std::collections::BTreeMap;

use zeroize::Zeroize;

use vellum_crypto::{decrypt, derive_key, encrypt, generate_random_bytes};

use crate::collection::CredentialCollection;
use crate::entry::StoredEntry;
use crate::error::{VaultError, VaultResult};
use crate::sealed::SealedVault;

/// Seal `collection` under a key derived from `secret`.
///
/// Every call draws a fresh vault salt and a fresh nonce, so sealing
/// the same data under the same secret twice yields unrelated
/// artifacts and nonce reuse cannot occur. The derived key and the
/// serialized plaintext are wiped before returning.
pub fn seal(collection: &CredentialCollection, secret: &[u8]) -> VaultResult<SealedVault> {
    let vault_salt = generate_random_bytes();
    let nonce = generate_random_bytes();

    let mut vault_key = derive_key(secret, &vault_salt)?;
    let mut plaintext = serde_json::to_vec(collection)?;

    let encrypted = encrypt(&vault_key, &nonce, &plaintext);
    vault_key.zeroize();
    plaintext.zeroize();
    let ciphertext = encrypted?;

    Ok(SealedVault {
        vault_salt,
        nonce,
        ciphertext,
    })
}

/// Unseal a vault back into its credential collection.
///
/// Derives the vault key from `secret` and the stored salt, then
/// authenticated-decrypts. Any tag mismatch, whether from a wrong
/// secret or corrupted or tampered data, fails with the opaque
/// [`VaultError::DecryptionFailure`]; no partial plaintext ever
/// escapes. Legacy bare-string entries are normalized to full records
/// here, once, before the collection is returned.
pub fn unseal(sealed: &SealedVault, secret: &[u8]) -> VaultResult<CredentialCollection> {
    let mut vault_key = derive_key(secret, &sealed.vault_salt)?;
    let decrypted = decrypt(&vault_key, &sealed.nonce, &sealed.ciphertext);
    vault_key.zeroize();

    let mut plaintext = decrypted.map_err(|_| VaultError::DecryptionFailure)?;

    let stored: BTreeMap<String, StoredEntry> = match serde_json::from_slice(&plaintext) {
        Ok(stored) => stored,
        Err(_) => {
            plaintext.zeroize();
            return Err(VaultError::DecryptionFailure);
        }
    };
    plaintext.zeroize();

    Ok(CredentialCollection::from_stored(stored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::CredentialRecord;

    fn sample_collection() -> CredentialCollection {
        let mut collection = CredentialCollection::new();
        collection.insert(
            "email",
            CredentialRecord::new("hunter2").with_category("personal"),
        );
        collection.insert(
            "bank",
            CredentialRecord::new("correct horse").with_field("iban", "DE02 1203 0000"),
        );
        collection
    }

    #[test]
    fn test_seal_unseal_roundtrip() {
        let collection = sample_collection();
        let sealed = seal(&collection, b"master passphrase").unwrap();

        let unsealed = unseal(&sealed, b"master passphrase").unwrap();
        assert_eq!(unsealed, collection);
    }

    #[test]
    fn test_wrong_secret_is_opaque_failure() {
        let sealed = seal(&sample_collection(), b"master passphrase").unwrap();

        let err = unseal(&sealed, b"master passphras3").unwrap_err();
        assert!(matches!(err, VaultError::DecryptionFailure));
    }

    #[test]
    fn test_tampered_ciphertext_is_opaque_failure() {
        let mut sealed = seal(&sample_collection(), b"master passphrase").unwrap();
        let last = sealed.ciphertext.len() - 1;
        sealed.ciphertext[last] ^= 0x01;

        let err = unseal(&sealed, b"master passphrase").unwrap_err();
        assert!(matches!(err, VaultError::DecryptionFailure));
    }

    #[test]
    fn test_reseal_is_fresh_every_time() {
        let collection = sample_collection();
        let first = seal(&collection, b"master passphrase").unwrap();
        let second = seal(&collection, b"master passphrase").unwrap();

        assert_ne!(first.vault_salt, second.vault_salt);
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_unseal_migrates_legacy_entries() {
        use vellum_crypto::{encrypt, generate_random_bytes, SALT_SIZE};

        // A vault written by an early client: entries are bare strings,
        // except one already in the structured form.
        let payload = r#"{
            "email": "hunter2",
            "wifi": "correct horse battery staple",
            "bank": {"value": "pin-1234", "updated_at": "2023-11-05T08:00:00Z"}
        }"#;

        let vault_salt: [u8; SALT_SIZE] = generate_random_bytes();
        let nonce = generate_random_bytes();
        let vault_key = derive_key(b"master passphrase", &vault_salt).unwrap();
        let ciphertext = encrypt(&vault_key, &nonce, payload.as_bytes()).unwrap();
        let sealed = SealedVault {
            vault_salt,
            nonce,
            ciphertext,
        };

        let collection = unseal(&sealed, b"master passphrase").unwrap();
        assert_eq!(collection.len(), 3);

        let email = collection.get("email").unwrap();
        assert_eq!(email.value, "hunter2");
        assert!(email.category.is_none());

        let bank = collection.get("bank").unwrap();
        assert_eq!(bank.value, "pin-1234");
        assert_eq!(
            bank.updated_at.to_rfc3339(),
            "2023-11-05T08:00:00+00:00"
        );

        // Legacy entries get their timestamp synthesized at unseal time.
        let wifi = collection.get("wifi").unwrap();
        assert!(wifi.updated_at > bank.updated_at);
    }

    #[test]
    fn test_garbled_plaintext_is_opaque_failure() {
        use vellum_crypto::{encrypt, generate_random_bytes, SALT_SIZE};

        let vault_salt: [u8; SALT_SIZE] = generate_random_bytes();
        let nonce = generate_random_bytes();
        let vault_key = derive_key(b"master passphrase", &vault_salt).unwrap();
        let ciphertext = encrypt(&vault_key, &nonce, b"not json at all").unwrap();
        let sealed = SealedVault {
            vault_salt,
            nonce,
            ciphertext,
        };

        let err = unseal(&sealed, b"master passphrase").unwrap_err();
        assert!(matches!(err, VaultError::DecryptionFailure));
    }
}
