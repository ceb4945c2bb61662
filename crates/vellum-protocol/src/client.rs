//! Credential-protocol orchestration over a [`RemoteAuthority`].

use std::sync::Arc;

use zeroize::{Zeroize, Zeroizing};

use vellum_crypto::{derive_key, generate_random_bytes, CryptoError, SALT_SIZE};
use vellum_vault::SealedVault;

use crate::authority::RemoteAuthority;
use crate::error::{ProtocolError, ProtocolResult};
use crate::wire::{
    LoginRequest, MfaLoginRequest, MfaSetupResponse, MfaVerifyRequest, RegisterRequest,
};

/// Client side of the credential protocol.
///
/// Orchestrates the salt-fetch, verifier-derivation and submission
/// steps of each operation in order. The user secret stays inside
/// this process; only verifiers derived from it are handed to the
/// authority. Cloning is cheap and clones share the underlying
/// authority, including its session token.
#[derive(Clone)]
pub struct AuthClient {
    authority: Arc<dyn RemoteAuthority>,
}

impl AuthClient {
    /// Client over an existing authority implementation.
    pub fn new(authority: Arc<dyn RemoteAuthority>) -> Self {
        Self { authority }
    }

    /// Client over an [`HttpAuthority`](crate::HttpAuthority) built
    /// from `config`.
    pub fn over_http(config: &crate::ClientConfig) -> ProtocolResult<Self> {
        Ok(Self::new(Arc::new(crate::HttpAuthority::new(config)?)))
    }

    /// The authentication salt registered for `username`.
    ///
    /// `NotFound` means no such account, which during login should
    /// prompt registration instead.
    pub async fn lookup_salt(&self, username: &str) -> ProtocolResult<[u8; SALT_SIZE]> {
        self.authority.fetch_auth_salt(username).await
    }

    /// Create an account from a fresh authentication salt and the
    /// verifier derived from `secret` under it.
    pub async fn register(&self, username: &str, secret: &str) -> ProtocolResult<()> {
        let auth_salt: [u8; SALT_SIZE] = generate_random_bytes();
        let verifier = compute_verifier(secret, auth_salt).await?;

        tracing::debug!(username, "submitting registration");
        self.authority
            .submit_registration(RegisterRequest {
                username: username.to_string(),
                salt: hex::encode(auth_salt),
                verifier,
            })
            .await
    }

    /// Authenticate and install the returned session token.
    ///
    /// The verifier is always derived and submitted, so `MfaRequired`
    /// doubles as proof that the secret was accepted and only a code
    /// is outstanding; callers then switch to
    /// [`login_with_second_factor`](Self::login_with_second_factor).
    /// Callers that want to collect the code up front without paying
    /// for a derivation can ask [`mfa_status`](Self::mfa_status)
    /// themselves.
    pub async fn login(&self, username: &str, secret: &str) -> ProtocolResult<String> {
        let salt = self.authority.fetch_auth_salt(username).await?;
        let verifier = compute_verifier(secret, salt).await?;

        let token = self
            .authority
            .submit_login(LoginRequest {
                username: username.to_string(),
                verifier,
            })
            .await?;

        tracing::info!(username, "login succeeded");
        self.authority.set_session_token(Some(token.clone()));
        Ok(token)
    }

    /// Authenticate with both the secret and a second-factor code,
    /// installing the returned session token.
    pub async fn login_with_second_factor(
        &self,
        username: &str,
        secret: &str,
        code: &str,
    ) -> ProtocolResult<String> {
        let salt = self.authority.fetch_auth_salt(username).await?;
        let verifier = compute_verifier(secret, salt).await?;

        let token = self
            .authority
            .submit_mfa_login(MfaLoginRequest {
                username: username.to_string(),
                verifier,
                mfa_code: code.to_string(),
            })
            .await?;

        tracing::info!(username, "second-factor login succeeded");
        self.authority.set_session_token(Some(token.clone()));
        Ok(token)
    }

    /// Whether `username` has a second factor enrolled.
    pub async fn mfa_status(&self, username: &str) -> ProtocolResult<bool> {
        self.authority.fetch_mfa_status(username).await
    }

    /// Begin second-factor enrollment for the authenticated account.
    ///
    /// Enrollment stays pending until one code from the returned
    /// setup material is confirmed with
    /// [`verify_second_factor`](Self::verify_second_factor).
    pub async fn enroll_second_factor(&self) -> ProtocolResult<MfaSetupResponse> {
        self.authority.begin_mfa_enrollment().await
    }

    /// Check a second-factor code. `Ok(false)` is the authority
    /// rejecting the code; errors are everything else.
    pub async fn verify_second_factor(&self, username: &str, code: &str) -> ProtocolResult<bool> {
        let request = MfaVerifyRequest {
            username: username.to_string(),
            code: code.to_string(),
        };
        match self.authority.confirm_mfa_code(request).await {
            Ok(()) => Ok(true),
            Err(ProtocolError::InvalidCredentials) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Disable the authenticated account's second factor. `Ok(false)`
    /// is the authority refusing the request.
    pub async fn disable_second_factor(&self) -> ProtocolResult<bool> {
        match self.authority.disable_mfa().await {
            Ok(()) => Ok(true),
            Err(ProtocolError::InvalidCredentials) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fetch the authenticated account's sealed vault, or `None` when
    /// none has been stored yet.
    pub async fn fetch_vault(&self) -> ProtocolResult<Option<SealedVault>> {
        match self.authority.fetch_vault().await {
            Ok(blob) => {
                let sealed = SealedVault::from_blob(&blob)
                    .map_err(|_| ProtocolError::Network("malformed vault blob in response".into()))?;
                Ok(Some(sealed))
            }
            Err(ProtocolError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replace the authenticated account's sealed vault.
    pub async fn store_vault(&self, sealed: &SealedVault) -> ProtocolResult<()> {
        self.authority.store_vault(sealed.to_blob()).await
    }

    /// The currently installed session token, if any.
    pub fn session_token(&self) -> Option<String> {
        self.authority.session_token()
    }

    /// Install a token obtained out of band, or re-assert one that a
    /// concurrent login overwrote. `None` clears the slot.
    pub fn set_session_token(&self, token: Option<String>) {
        self.authority.set_session_token(token);
    }

    /// Drop the session token; subsequent authenticated calls fail
    /// until the next login.
    pub fn logout(&self) {
        tracing::info!("session token cleared");
        self.authority.set_session_token(None);
    }
}

/// Derive the hex verifier for `secret` under `salt` on a blocking
/// worker, since the derivation costs 128 MiB and hundreds of
/// milliseconds by construction.
async fn compute_verifier(secret: &str, salt: [u8; SALT_SIZE]) -> ProtocolResult<String> {
    let secret = Zeroizing::new(secret.as_bytes().to_vec());
    let verifier = tokio::task::spawn_blocking(move || {
        let mut key = derive_key(&secret, &salt)?;
        let encoded = hex::encode(key);
        key.zeroize();
        Ok::<_, CryptoError>(encoded)
    })
    .await
    .map_err(|_| CryptoError::DerivationFailure)??;
    Ok(verifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryAuthority;
    use vellum_crypto::NONCE_SIZE;
    use vellum_vault::VaultBlob;

    fn client_over(authority: Arc<InMemoryAuthority>) -> AuthClient {
        AuthClient::new(authority)
    }

    /// Registers `username` with a throwaway hex verifier and logs in,
    /// bypassing key derivation entirely.
    async fn seed_session(authority: &InMemoryAuthority, username: &str) {
        authority
            .submit_registration(RegisterRequest {
                username: username.to_string(),
                salt: "ab".repeat(SALT_SIZE),
                verifier: "cd".repeat(32),
            })
            .await
            .unwrap();
        let token = authority
            .submit_login(LoginRequest {
                username: username.to_string(),
                verifier: "cd".repeat(32),
            })
            .await
            .unwrap();
        authority.set_session_token(Some(token));
    }

    #[tokio::test]
    async fn test_register_then_login_installs_token() {
        let authority = Arc::new(InMemoryAuthority::new());
        let client = client_over(authority.clone());

        client.register("alice", "correct horse battery").await.unwrap();
        let token = client.login("alice", "correct horse battery").await.unwrap();

        assert!(!token.is_empty());
        assert_eq!(client.session_token(), Some(token));

        // The authority never saw the secret, only a derived verifier.
        let stored = authority.verifier_of("alice").unwrap();
        assert_ne!(stored, "correct horse battery");
        assert!(!stored.contains("horse"));
        assert_eq!(stored.len(), 64);
    }

    #[tokio::test]
    async fn test_login_unknown_account_is_not_found() {
        let client = client_over(Arc::new(InMemoryAuthority::new()));

        let err = client.login("nobody", "whatever").await.unwrap_err();
        assert!(matches!(err, ProtocolError::NotFound));
    }

    #[tokio::test]
    async fn test_lookup_salt_distinguishes_missing_accounts() {
        let client = client_over(Arc::new(InMemoryAuthority::new()));

        let err = client.lookup_salt("nobody").await.unwrap_err();
        assert!(matches!(err, ProtocolError::NotFound));

        client.register("alice", "correct horse battery").await.unwrap();
        let first = client.lookup_salt("alice").await.unwrap();
        let second = client.lookup_salt("alice").await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first, [0u8; SALT_SIZE]);
    }

    #[tokio::test]
    async fn test_login_wrong_secret_is_invalid_credentials() {
        let client = client_over(Arc::new(InMemoryAuthority::new()));

        client.register("bob", "right secret").await.unwrap();
        let err = client.login("bob", "wrong secret").await.unwrap_err();

        assert!(matches!(err, ProtocolError::InvalidCredentials));
        assert!(client.session_token().is_none());
    }

    #[tokio::test]
    async fn test_login_gates_on_enrolled_second_factor() {
        let authority = Arc::new(InMemoryAuthority::new());
        let client = client_over(authority.clone());

        client.register("carol", "sturdy secret").await.unwrap();
        authority.force_enable_mfa("carol");

        // A wrong secret fails as InvalidCredentials; the challenge is
        // only ever revealed once the verifier has matched.
        let err = client.login("carol", "wrong secret").await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidCredentials));
        assert!(client.session_token().is_none());

        let err = client.login("carol", "sturdy secret").await.unwrap_err();
        assert!(matches!(err, ProtocolError::MfaRequired));

        let token = client
            .login_with_second_factor("carol", "sturdy secret", InMemoryAuthority::VALID_MFA_CODE)
            .await
            .unwrap();
        assert_eq!(client.session_token(), Some(token));
    }

    #[tokio::test]
    async fn test_second_factor_enrollment_flow() {
        let authority = Arc::new(InMemoryAuthority::new());
        let client = client_over(authority.clone());
        seed_session(&authority, "dave").await;

        assert!(!client.mfa_status("dave").await.unwrap());

        let setup = client.enroll_second_factor().await.unwrap();
        assert!(!setup.secret.is_empty());
        assert!(!setup.backup_codes.is_empty());
        // Pending enrollment is not yet enabled.
        assert!(!client.mfa_status("dave").await.unwrap());

        assert!(!client.verify_second_factor("dave", "000000").await.unwrap());
        assert!(client
            .verify_second_factor("dave", InMemoryAuthority::VALID_MFA_CODE)
            .await
            .unwrap());
        assert!(client.mfa_status("dave").await.unwrap());

        assert!(client.disable_second_factor().await.unwrap());
        assert!(!client.mfa_status("dave").await.unwrap());
    }

    #[tokio::test]
    async fn test_vault_fetch_none_then_store_then_roundtrip() {
        let authority = Arc::new(InMemoryAuthority::new());
        let client = client_over(authority.clone());
        seed_session(&authority, "erin").await;

        assert!(client.fetch_vault().await.unwrap().is_none());

        let sealed = SealedVault {
            vault_salt: [7u8; SALT_SIZE],
            nonce: [9u8; NONCE_SIZE],
            ciphertext: vec![1, 2, 3, 4],
        };
        client.store_vault(&sealed).await.unwrap();

        let fetched = client.fetch_vault().await.unwrap().unwrap();
        assert_eq!(fetched, sealed);
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_retry_after_verbatim() {
        let authority = Arc::new(InMemoryAuthority::new());
        let client = client_over(authority.clone());

        client.register("frank", "good secret").await.unwrap();
        for _ in 0..5 {
            let err = authority
                .submit_login(LoginRequest {
                    username: "frank".to_string(),
                    verifier: "00".repeat(32),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ProtocolError::InvalidCredentials));
        }

        // Even the correct secret is refused while the window holds.
        let err = client.login("frank", "good secret").await.unwrap_err();
        match err {
            ProtocolError::RateLimited { retry_after } => {
                assert!(retry_after.as_secs() > 0);
                assert!(retry_after.as_secs() <= 60);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_logout_clears_token() {
        let authority = Arc::new(InMemoryAuthority::new());
        let client = client_over(authority.clone());
        seed_session(&authority, "grace").await;

        assert!(client.session_token().is_some());
        client.logout();
        assert!(client.session_token().is_none());
        assert!(matches!(
            client.fetch_vault().await,
            Err(ProtocolError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_fetch_vault_rejects_malformed_blob() {
        let authority = Arc::new(InMemoryAuthority::new());
        let client = client_over(authority.clone());
        seed_session(&authority, "henry").await;

        authority
            .store_vault(VaultBlob {
                vault_salt: "zz".repeat(SALT_SIZE),
                nonce: "00".repeat(NONCE_SIZE),
                ciphertext: "00".repeat(20),
            })
            .await
            .unwrap();

        assert!(matches!(
            client.fetch_vault().await,
            Err(ProtocolError::Network(_))
        ));
    }
}
