//! In-memory authority for test suites.
//!
//! Implements the full wire contract against process-local maps,
//! including the authority-side failure rate limiter, so protocol and
//! session flows can be tested without a server. Compiled for this
//! crate's own tests and for consumers enabling the `testing` feature.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use vellum_crypto::SALT_SIZE;
use vellum_vault::VaultBlob;

use crate::authority::RemoteAuthority;
use crate::error::{ProtocolError, ProtocolResult};
use crate::wire::{
    LoginRequest, MfaLoginRequest, MfaSetupResponse, MfaVerifyRequest, RegisterRequest,
};

const MAX_FAILURES: u32 = 5;
const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Account {
    salt: String,
    verifier: String,
    mfa: MfaState,
}

#[derive(Debug)]
enum MfaState {
    Disabled,
    Pending { backup_codes: Vec<String> },
    Enabled { backup_codes: Vec<String> },
}

impl MfaState {
    fn enabled(&self) -> bool {
        matches!(self, MfaState::Enabled { .. })
    }

    /// Whether `code` is accepted, consuming it when it is a backup
    /// code. Backup codes are single use.
    fn accepts(&mut self, code: &str) -> bool {
        let codes = match self {
            MfaState::Disabled => return false,
            MfaState::Pending { backup_codes } | MfaState::Enabled { backup_codes } => backup_codes,
        };
        if code == InMemoryAuthority::VALID_MFA_CODE {
            return true;
        }
        if let Some(pos) = codes.iter().position(|c| c == code) {
            codes.remove(pos);
            return true;
        }
        false
    }

    fn promote(&mut self) {
        if let MfaState::Pending { backup_codes } = self {
            *self = MfaState::Enabled {
                backup_codes: std::mem::take(backup_codes),
            };
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    failures: u32,
    window_start: Instant,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-local [`RemoteAuthority`] with real throttling semantics.
pub struct InMemoryAuthority {
    accounts: Mutex<HashMap<String, Account>>,
    vaults: Mutex<HashMap<String, VaultBlob>>,
    /// token -> username
    tokens: Mutex<HashMap<String, String>>,
    limits: Mutex<HashMap<String, FailureWindow>>,
    session_token: Mutex<Option<String>>,
    rate_window: Duration,
    next_id: AtomicU64,
}

impl InMemoryAuthority {
    /// The one authenticator code every pending or enabled second
    /// factor accepts.
    pub const VALID_MFA_CODE: &'static str = "246810";

    /// Authority with the production-like 60-second failure window.
    pub fn new() -> Self {
        Self::with_rate_window(DEFAULT_RATE_WINDOW)
    }

    /// Authority with a custom failure window, for tests exercising
    /// window expiry without waiting a minute.
    pub fn with_rate_window(rate_window: Duration) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            vaults: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            limits: Mutex::new(HashMap::new()),
            session_token: Mutex::new(None),
            rate_window,
            next_id: AtomicU64::new(1),
        }
    }

    /// The verifier stored for `username` at registration, for
    /// asserting what the authority actually saw.
    pub fn verifier_of(&self, username: &str) -> Option<String> {
        guard(&self.accounts)
            .get(username)
            .map(|account| account.verifier.clone())
    }

    /// The blob stored for `username`, if any.
    pub fn stored_vault(&self, username: &str) -> Option<VaultBlob> {
        guard(&self.vaults).get(username).cloned()
    }

    /// Skip enrollment and mark `username` second-factor enabled with
    /// a fresh set of backup codes.
    pub fn force_enable_mfa(&self, username: &str) {
        if let Some(account) = guard(&self.accounts).get_mut(username) {
            account.mfa = MfaState::Enabled {
                backup_codes: self.fresh_backup_codes(),
            };
        }
    }

    /// The remaining backup codes for `username`.
    pub fn backup_codes_of(&self, username: &str) -> Vec<String> {
        match guard(&self.accounts).get(username).map(|a| &a.mfa) {
            Some(MfaState::Pending { backup_codes }) | Some(MfaState::Enabled { backup_codes }) => {
                backup_codes.clone()
            }
            _ => Vec::new(),
        }
    }

    fn fresh_backup_codes(&self) -> Vec<String> {
        let batch = self.next_id.fetch_add(1, Ordering::Relaxed);
        (1..=8).map(|i| format!("rescue-{batch:04}-{i}")).collect()
    }

    fn mint_token(&self, username: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = format!("session-{n:04}");
        guard(&self.tokens).insert(token.clone(), username.to_string());
        token
    }

    fn authenticated_user(&self) -> ProtocolResult<String> {
        let token = guard(&self.session_token)
            .clone()
            .ok_or(ProtocolError::NotAuthenticated)?;
        guard(&self.tokens)
            .get(&token)
            .cloned()
            .ok_or(ProtocolError::NotAuthenticated)
    }

    /// Refuse before any credential check once the window is full.
    fn check_rate_limit(&self, username: &str) -> ProtocolResult<()> {
        let mut limits = guard(&self.limits);
        if let Some(state) = limits.get(username) {
            if state.failures >= MAX_FAILURES {
                let elapsed = state.window_start.elapsed();
                if elapsed < self.rate_window {
                    return Err(ProtocolError::RateLimited {
                        retry_after: self.rate_window - elapsed,
                    });
                }
                limits.remove(username);
            }
        }
        Ok(())
    }

    fn record_failure(&self, username: &str) {
        let mut limits = guard(&self.limits);
        let state = limits.entry(username.to_string()).or_insert(FailureWindow {
            failures: 0,
            window_start: Instant::now(),
        });
        if state.window_start.elapsed() >= self.rate_window {
            state.failures = 0;
            state.window_start = Instant::now();
        }
        state.failures += 1;
    }

    fn reset_failures(&self, username: &str) {
        guard(&self.limits).remove(username);
    }
}

impl Default for InMemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteAuthority for InMemoryAuthority {
    async fn fetch_auth_salt(&self, username: &str) -> ProtocolResult<[u8; SALT_SIZE]> {
        let salt_hex = guard(&self.accounts)
            .get(username)
            .map(|account| account.salt.clone())
            .ok_or(ProtocolError::NotFound)?;
        let bytes =
            hex::decode(&salt_hex).map_err(|_| ProtocolError::Network("malformed salt".into()))?;
        bytes
            .try_into()
            .map_err(|_| ProtocolError::Network("malformed salt".into()))
    }

    async fn submit_registration(&self, request: RegisterRequest) -> ProtocolResult<()> {
        let mut accounts = guard(&self.accounts);
        if accounts.contains_key(&request.username) {
            return Err(ProtocolError::UsernameTaken);
        }
        accounts.insert(
            request.username,
            Account {
                salt: request.salt,
                verifier: request.verifier,
                mfa: MfaState::Disabled,
            },
        );
        Ok(())
    }

    async fn submit_login(&self, request: LoginRequest) -> ProtocolResult<String> {
        self.check_rate_limit(&request.username)?;
        {
            let accounts = guard(&self.accounts);
            let account = accounts
                .get(&request.username)
                .ok_or(ProtocolError::NotFound)?;
            if account.verifier != request.verifier {
                drop(accounts);
                self.record_failure(&request.username);
                return Err(ProtocolError::InvalidCredentials);
            }
            if account.mfa.enabled() {
                return Err(ProtocolError::MfaRequired);
            }
        }
        self.reset_failures(&request.username);
        Ok(self.mint_token(&request.username))
    }

    async fn submit_mfa_login(&self, request: MfaLoginRequest) -> ProtocolResult<String> {
        self.check_rate_limit(&request.username)?;
        {
            let mut accounts = guard(&self.accounts);
            let account = accounts
                .get_mut(&request.username)
                .ok_or(ProtocolError::NotFound)?;
            if account.verifier != request.verifier || !account.mfa.accepts(&request.mfa_code) {
                drop(accounts);
                self.record_failure(&request.username);
                return Err(ProtocolError::InvalidCredentials);
            }
        }
        self.reset_failures(&request.username);
        Ok(self.mint_token(&request.username))
    }

    async fn fetch_mfa_status(&self, username: &str) -> ProtocolResult<bool> {
        guard(&self.accounts)
            .get(username)
            .map(|account| account.mfa.enabled())
            .ok_or(ProtocolError::NotFound)
    }

    async fn begin_mfa_enrollment(&self) -> ProtocolResult<MfaSetupResponse> {
        let username = self.authenticated_user()?;
        let backup_codes = self.fresh_backup_codes();

        let mut accounts = guard(&self.accounts);
        let account = accounts.get_mut(&username).ok_or(ProtocolError::NotFound)?;
        account.mfa = MfaState::Pending {
            backup_codes: backup_codes.clone(),
        };

        Ok(MfaSetupResponse {
            secret: "JBSWY3DPEHPK3PXP".to_string(),
            qr_code: format!(
                "otpauth://totp/vellum:{username}?secret=JBSWY3DPEHPK3PXP&issuer=vellum"
            ),
            backup_codes,
        })
    }

    async fn confirm_mfa_code(&self, request: MfaVerifyRequest) -> ProtocolResult<()> {
        self.check_rate_limit(&request.username)?;
        {
            let mut accounts = guard(&self.accounts);
            let account = accounts
                .get_mut(&request.username)
                .ok_or(ProtocolError::NotFound)?;
            if !account.mfa.accepts(&request.code) {
                drop(accounts);
                self.record_failure(&request.username);
                return Err(ProtocolError::InvalidCredentials);
            }
            account.mfa.promote();
        }
        self.reset_failures(&request.username);
        Ok(())
    }

    async fn disable_mfa(&self) -> ProtocolResult<()> {
        let username = self.authenticated_user()?;
        let mut accounts = guard(&self.accounts);
        let account = accounts.get_mut(&username).ok_or(ProtocolError::NotFound)?;
        account.mfa = MfaState::Disabled;
        Ok(())
    }

    async fn fetch_vault(&self) -> ProtocolResult<VaultBlob> {
        let username = self.authenticated_user()?;
        guard(&self.vaults)
            .get(&username)
            .cloned()
            .ok_or(ProtocolError::NotFound)
    }

    async fn store_vault(&self, blob: VaultBlob) -> ProtocolResult<()> {
        let username = self.authenticated_user()?;
        guard(&self.vaults).insert(username, blob);
        Ok(())
    }

    fn set_session_token(&self, token: Option<String>) {
        *guard(&self.session_token) = token;
    }

    fn session_token(&self) -> Option<String> {
        guard(&self.session_token).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn register(authority: &InMemoryAuthority, username: &str, verifier: &str) {
        authority
            .submit_registration(RegisterRequest {
                username: username.to_string(),
                salt: "ab".repeat(SALT_SIZE),
                verifier: verifier.to_string(),
            })
            .await
            .unwrap();
    }

    async fn login(
        authority: &InMemoryAuthority,
        username: &str,
        verifier: &str,
    ) -> ProtocolResult<String> {
        authority
            .submit_login(LoginRequest {
                username: username.to_string(),
                verifier: verifier.to_string(),
            })
            .await
    }

    async fn mfa_login(
        authority: &InMemoryAuthority,
        username: &str,
        code: &str,
    ) -> ProtocolResult<String> {
        authority
            .submit_mfa_login(MfaLoginRequest {
                username: username.to_string(),
                verifier: "good".to_string(),
                mfa_code: code.to_string(),
            })
            .await
    }

    #[tokio::test]
    async fn test_sixth_attempt_is_rate_limited() {
        let authority = InMemoryAuthority::new();
        register(&authority, "alice", "good").await;

        for _ in 0..5 {
            assert!(matches!(
                login(&authority, "alice", "bad").await,
                Err(ProtocolError::InvalidCredentials)
            ));
        }

        match login(&authority, "alice", "good").await {
            Err(ProtocolError::RateLimited { retry_after }) => {
                assert!(retry_after > Duration::ZERO);
                assert!(retry_after <= Duration::from_secs(60));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_window_expiry_clears_limit() {
        let authority = InMemoryAuthority::with_rate_window(Duration::from_millis(50));
        register(&authority, "bob", "good").await;

        for _ in 0..5 {
            let _ = login(&authority, "bob", "bad").await;
        }
        assert!(matches!(
            login(&authority, "bob", "good").await,
            Err(ProtocolError::RateLimited { .. })
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(login(&authority, "bob", "good").await.is_ok());
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let authority = InMemoryAuthority::new();
        register(&authority, "carol", "good").await;

        for _ in 0..4 {
            let _ = login(&authority, "carol", "bad").await;
        }
        assert!(login(&authority, "carol", "good").await.is_ok());

        // A full window of failures is available again.
        for _ in 0..5 {
            assert!(matches!(
                login(&authority, "carol", "bad").await,
                Err(ProtocolError::InvalidCredentials)
            ));
        }
        assert!(matches!(
            login(&authority, "carol", "bad").await,
            Err(ProtocolError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_backup_code_is_single_use() {
        let authority = InMemoryAuthority::new();
        register(&authority, "dave", "good").await;
        authority.force_enable_mfa("dave");

        let code = authority.backup_codes_of("dave")[0].clone();
        assert!(mfa_login(&authority, "dave", &code).await.is_ok());
        assert!(matches!(
            mfa_login(&authority, "dave", &code).await,
            Err(ProtocolError::InvalidCredentials)
        ));
        assert_eq!(authority.backup_codes_of("dave").len(), 7);
    }

    #[tokio::test]
    async fn test_pending_enrollment_is_not_enabled() {
        let authority = InMemoryAuthority::new();
        register(&authority, "erin", "good").await;
        let token = login(&authority, "erin", "good").await.unwrap();
        authority.set_session_token(Some(token));

        authority.begin_mfa_enrollment().await.unwrap();
        assert!(!authority.fetch_mfa_status("erin").await.unwrap());

        authority
            .confirm_mfa_code(MfaVerifyRequest {
                username: "erin".to_string(),
                code: InMemoryAuthority::VALID_MFA_CODE.to_string(),
            })
            .await
            .unwrap();
        assert!(authority.fetch_mfa_status("erin").await.unwrap());
    }
}
