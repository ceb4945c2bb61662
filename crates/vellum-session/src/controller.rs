//! The session-lock state machine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{self, Instant};
use zeroize::Zeroizing;

use vellum_crypto::CryptoError;
use vellum_protocol::wire::MfaSetupResponse;
use vellum_protocol::{AuthClient, ProtocolError};
use vellum_vault::{seal, unseal, CredentialCollection, SealedVault, VaultError};

use crate::audit::{AuditEvent, AuditLog, LockReason};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::events::HostEvent;

/// Externally visible position in the lock state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No authenticated session exists.
    SignedOut,
    /// Credentials are decrypted in memory and may be rendered.
    Unlocked,
    /// A session exists but access is gated on re-entering the secret.
    Locked,
    /// The secret was verified; a second-factor code is outstanding.
    AwaitingSecondFactor,
}

/// How an authentication step concluded when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The session is unlocked.
    Unlocked,
    /// The secret was accepted; a second-factor code is required to
    /// finish.
    SecondFactorRequired,
}

/// Decrypted material owned by an unlocked session.
///
/// The secret is retained while unlocked because every save re-seals
/// the whole collection under a freshly salted key. All of it is
/// discarded on lock or sign-out.
struct UnlockedSession {
    username: String,
    secret: Zeroizing<String>,
    token: String,
    collection: CredentialCollection,
    sealed: Option<SealedVault>,
}

struct LockedSession {
    username: String,
    sealed: Option<SealedVault>,
}

/// Tentative unlock that passed secret verification and now awaits a
/// second-factor code. Cancelling drops the secret and the decrypted
/// collection.
struct PendingUnlock {
    username: String,
    secret: Zeroizing<String>,
    collection: CredentialCollection,
    sealed: Option<SealedVault>,
}

enum SessionState {
    SignedOut,
    Unlocked(UnlockedSession),
    Locked(LockedSession),
    AwaitingSecondFactor(PendingUnlock),
}

struct SessionCore {
    state: SessionState,
    /// Start sequence of the attempt that produced the current state.
    /// A completed attempt only installs its result when its own
    /// sequence is newer, so a stale login can never overwrite a more
    /// recent one, and locks and sign-outs invalidate everything
    /// still in flight.
    installed_attempt: u64,
}

struct Inner {
    client: AuthClient,
    config: SessionConfig,
    core: Mutex<SessionCore>,
    /// Serializes seal-and-store, so an earlier save can never land on
    /// the authority after a later one. Held across awaits that `core`
    /// must stay free for.
    writes: Mutex<()>,
    deadline: watch::Sender<Option<Instant>>,
    attempts: AtomicU64,
    audit: AuditLog,
}

/// Drives lock state, the idle countdown and unlock re-authorization.
///
/// Cheap to clone; clones share one state machine. Dropping the last
/// clone stops the background watchdog and event pump.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
    events: mpsc::UnboundedSender<HostEvent>,
}

impl SessionController {
    /// Controller over `client`, starting signed out.
    pub fn new(client: AuthClient, config: SessionConfig) -> Self {
        let (deadline_tx, deadline_rx) = watch::channel(None);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            client,
            audit: AuditLog::new(config.audit_capacity),
            config,
            core: Mutex::new(SessionCore {
                state: SessionState::SignedOut,
                installed_attempt: 0,
            }),
            writes: Mutex::new(()),
            deadline: deadline_tx,
            attempts: AtomicU64::new(0),
        });

        tokio::spawn(run_idle_watchdog(Arc::downgrade(&inner), deadline_rx));
        tokio::spawn(run_event_pump(Arc::downgrade(&inner), event_rx));

        Self {
            inner,
            events: event_tx,
        }
    }

    /// Sender for host activity and lifecycle events.
    pub fn events(&self) -> mpsc::UnboundedSender<HostEvent> {
        self.events.clone()
    }

    /// Current position in the state machine.
    pub async fn lock_state(&self) -> LockState {
        let core = self.inner.core.lock().await;
        match core.state {
            SessionState::SignedOut => LockState::SignedOut,
            SessionState::Unlocked(_) => LockState::Unlocked,
            SessionState::Locked(_) => LockState::Locked,
            SessionState::AwaitingSecondFactor(_) => LockState::AwaitingSecondFactor,
        }
    }

    /// Recorded audit entries, oldest first.
    pub fn audit_entries(&self) -> Vec<crate::audit::AuditEntry> {
        self.inner.audit.entries()
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, username: &str, secret: &str) -> SessionResult<()> {
        self.inner.client.register(username, secret).await?;
        Ok(())
    }

    /// Authenticate, fetch and unseal the vault, and enter `Unlocked`.
    ///
    /// Returns [`AuthOutcome::SecondFactorRequired`] without changing
    /// state when the account has a second factor enrolled; finish
    /// with [`sign_in_with_code`](Self::sign_in_with_code).
    pub async fn sign_in(&self, username: &str, secret: &str) -> SessionResult<AuthOutcome> {
        self.ensure_signed_out().await?;
        // Check enrollment first so an enrolled account is prompted
        // for its code before any derivation work is spent on this
        // secret.
        if self.inner.client.mfa_status(username).await? {
            return Ok(AuthOutcome::SecondFactorRequired);
        }
        let seq = self.next_attempt();
        let secret = Zeroizing::new(secret.to_string());

        let token = match self.inner.client.login(username, &secret).await {
            Ok(token) => token,
            // Enrollment finished between the check and the login.
            Err(ProtocolError::MfaRequired) => return Ok(AuthOutcome::SecondFactorRequired),
            Err(e) => return Err(e.into()),
        };

        self.complete_sign_in(seq, username, secret, token).await
    }

    /// Authenticate with the secret and a second-factor code.
    pub async fn sign_in_with_code(
        &self,
        username: &str,
        secret: &str,
        code: &str,
    ) -> SessionResult<AuthOutcome> {
        self.ensure_signed_out().await?;
        let seq = self.next_attempt();
        let secret = Zeroizing::new(secret.to_string());

        let token = self
            .inner
            .client
            .login_with_second_factor(username, &secret, code)
            .await?;

        self.complete_sign_in(seq, username, secret, token).await
    }

    async fn complete_sign_in(
        &self,
        seq: u64,
        username: &str,
        secret: Zeroizing<String>,
        token: String,
    ) -> SessionResult<AuthOutcome> {
        let sealed = match self.inner.client.fetch_vault().await {
            Ok(sealed) => sealed,
            Err(e) => {
                discard_attempt_token(&self.inner).await;
                return Err(e.into());
            }
        };
        let collection = match &sealed {
            Some(sealed) => match unseal_off_thread(sealed.clone(), secret.clone()).await {
                Ok(collection) => collection,
                Err(_) => {
                    discard_attempt_token(&self.inner).await;
                    return Err(SessionError::InvalidCredentials);
                }
            },
            None => CredentialCollection::new(),
        };

        install_session(
            &self.inner,
            seq,
            UnlockedSession {
                username: username.to_string(),
                secret,
                token,
                collection,
                sealed,
            },
            AuditEvent::SignedIn {
                username: username.to_string(),
            },
        )
        .await
    }

    /// Re-verify the secret and re-authorize access from `Locked`.
    ///
    /// The secret is first checked locally by unsealing the current
    /// vault, then a fresh session token is acquired. When no vault
    /// has ever been stored there is nothing to unseal, and the check
    /// happens by submitting the verifier instead. With a second
    /// factor enrolled this stops at `AwaitingSecondFactor` and
    /// returns [`AuthOutcome::SecondFactorRequired`]; an incorrect
    /// secret can never reach that step on either path.
    pub async fn unlock(&self, secret: &str) -> SessionResult<AuthOutcome> {
        let (username, sealed) = {
            let core = self.inner.core.lock().await;
            match &core.state {
                SessionState::Locked(locked) => (locked.username.clone(), locked.sealed.clone()),
                SessionState::Unlocked(_) => return Ok(AuthOutcome::Unlocked),
                SessionState::AwaitingSecondFactor(_) => {
                    return Err(SessionError::SecondFactorPending)
                }
                SessionState::SignedOut => return Err(SessionError::NotSignedIn),
            }
        };
        let seq = self.next_attempt();
        let secret = Zeroizing::new(secret.to_string());

        let collection = match &sealed {
            Some(sealed) => match unseal_off_thread(sealed.clone(), secret.clone()).await {
                Ok(collection) => collection,
                Err(_) => {
                    self.inner.audit.record(AuditEvent::UnlockFailed);
                    return Err(SessionError::InvalidCredentials);
                }
            },
            None => CredentialCollection::new(),
        };

        // A successful unseal vouches for the secret, so an enrolled
        // account can move straight to the code challenge. Without a
        // vault only the authority can vouch for it: fall through to
        // the login, where `MfaRequired` comes back only after the
        // verifier has matched.
        if sealed.is_some() && self.inner.client.mfa_status(&username).await? {
            return install_pending(
                &self.inner,
                seq,
                PendingUnlock {
                    username,
                    secret,
                    collection,
                    sealed,
                },
            )
            .await;
        }

        match self.inner.client.login(&username, &secret).await {
            Ok(token) => {
                install_session(
                    &self.inner,
                    seq,
                    UnlockedSession {
                        username,
                        secret,
                        token,
                        collection,
                        sealed,
                    },
                    AuditEvent::Unlocked,
                )
                .await
            }
            Err(ProtocolError::MfaRequired) => {
                install_pending(
                    &self.inner,
                    seq,
                    PendingUnlock {
                        username,
                        secret,
                        collection,
                        sealed,
                    },
                )
                .await
            }
            Err(ProtocolError::InvalidCredentials) => {
                self.inner.audit.record(AuditEvent::UnlockFailed);
                Err(SessionError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Answer the outstanding second-factor challenge.
    pub async fn submit_second_factor(&self, code: &str) -> SessionResult<()> {
        let (username, secret) = {
            let core = self.inner.core.lock().await;
            match &core.state {
                SessionState::AwaitingSecondFactor(pending) => {
                    (pending.username.clone(), pending.secret.clone())
                }
                _ => return Err(SessionError::NoPendingChallenge),
            }
        };
        let seq = self.next_attempt();

        match self
            .inner
            .client
            .login_with_second_factor(&username, &secret, code)
            .await
        {
            Ok(token) => {
                let mut core = self.inner.core.lock().await;
                if seq <= core.installed_attempt {
                    tracing::debug!("discarding superseded second-factor result");
                    restore_token(&self.inner, &core);
                    return outcome_for_current(&core).map(|_| ());
                }
                match std::mem::replace(&mut core.state, SessionState::SignedOut) {
                    SessionState::AwaitingSecondFactor(pending) => {
                        core.installed_attempt = seq;
                        self.inner.client.set_session_token(Some(token.clone()));
                        core.state = SessionState::Unlocked(UnlockedSession {
                            username: pending.username,
                            secret: pending.secret,
                            token,
                            collection: pending.collection,
                            sealed: pending.sealed,
                        });
                        arm_deadline(&self.inner);
                        self.inner.audit.record(AuditEvent::Unlocked);
                        Ok(())
                    }
                    other => {
                        core.state = other;
                        restore_token(&self.inner, &core);
                        Err(SessionError::NoPendingChallenge)
                    }
                }
            }
            Err(ProtocolError::InvalidCredentials) => {
                self.inner.audit.record(AuditEvent::UnlockFailed);
                Err(SessionError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Abandon the outstanding second-factor challenge, discarding
    /// the tentative secret and returning to `Locked`. Has no effect
    /// on the account's second-factor enrollment.
    pub async fn cancel_second_factor(&self) -> SessionResult<()> {
        let mut core = self.inner.core.lock().await;
        match std::mem::replace(&mut core.state, SessionState::SignedOut) {
            SessionState::AwaitingSecondFactor(pending) => {
                core.installed_attempt = self.inner.attempts.load(Ordering::Relaxed);
                core.state = SessionState::Locked(LockedSession {
                    username: pending.username,
                    sealed: pending.sealed,
                });
                Ok(())
            }
            other => {
                core.state = other;
                Err(SessionError::NoPendingChallenge)
            }
        }
    }

    /// Lock the session now, discarding decrypted material.
    pub async fn lock(&self) -> SessionResult<()> {
        apply_lock(&self.inner, LockReason::Manual).await
    }

    /// End the session entirely: clear the token and discard all
    /// decrypted material and key inputs.
    pub async fn sign_out(&self) -> SessionResult<()> {
        let mut core = self.inner.core.lock().await;
        if matches!(core.state, SessionState::SignedOut) {
            return Ok(());
        }
        core.installed_attempt = self.inner.attempts.load(Ordering::Relaxed);
        core.state = SessionState::SignedOut;
        let _ = self.inner.deadline.send(None);
        self.inner.client.logout();
        self.inner.audit.record(AuditEvent::SignedOut);
        Ok(())
    }

    /// Snapshot of the decrypted collection, only while `Unlocked`.
    pub async fn credentials(&self) -> SessionResult<CredentialCollection> {
        let core = self.inner.core.lock().await;
        match &core.state {
            SessionState::Unlocked(session) => Ok(session.collection.clone()),
            SessionState::SignedOut => Err(SessionError::NotSignedIn),
            _ => Err(SessionError::VaultLocked),
        }
    }

    /// Mutate the collection, then seal and push the result.
    ///
    /// The remote vault is replaced wholesale, never merged. On a
    /// push failure the local edit is kept and rides along with the
    /// next successful save. The seal and the push run without the
    /// state lock held, so a due idle lock is never stuck behind a
    /// save in flight; a lock landing mid-save wins, and the save
    /// reports [`VaultLocked`](SessionError::VaultLocked).
    pub async fn update_credentials<F>(&self, mutate: F) -> SessionResult<()>
    where
        F: FnOnce(&mut CredentialCollection),
    {
        let _write = self.inner.writes.lock().await;

        let (snapshot, secret, epoch) = {
            let mut core = self.inner.core.lock().await;
            let epoch = core.installed_attempt;
            let session = match &mut core.state {
                SessionState::Unlocked(session) => session,
                SessionState::SignedOut => return Err(SessionError::NotSignedIn),
                _ => return Err(SessionError::VaultLocked),
            };
            mutate(&mut session.collection);
            (session.collection.clone(), session.secret.clone(), epoch)
        };

        let sealed = seal_off_thread(snapshot, secret).await?;

        // The watchdog may have locked while the seal ran; the edit
        // only existed in plaintext that is gone now, so the stale
        // blob must not reach the authority.
        if !self.still_unlocked(epoch).await {
            return Err(SessionError::VaultLocked);
        }

        self.inner.client.store_vault(&sealed).await?;

        let mut core = self.inner.core.lock().await;
        let current = core.installed_attempt == epoch;
        match &mut core.state {
            SessionState::Unlocked(session) if current => {
                session.sealed = Some(sealed);
                Ok(())
            }
            _ => Err(SessionError::VaultLocked),
        }
    }

    /// Begin second-factor enrollment for the unlocked session.
    pub async fn enroll_second_factor(&self) -> SessionResult<MfaSetupResponse> {
        self.require_unlocked().await?;
        Ok(self.inner.client.enroll_second_factor().await?)
    }

    /// Confirm an enrollment code. `Ok(false)` means the code was
    /// refused and enrollment stays pending.
    pub async fn confirm_second_factor(&self, code: &str) -> SessionResult<bool> {
        let username = self.require_unlocked().await?;
        Ok(self
            .inner
            .client
            .verify_second_factor(&username, code)
            .await?)
    }

    /// Disable the second factor for the unlocked session.
    pub async fn disable_second_factor(&self) -> SessionResult<bool> {
        self.require_unlocked().await?;
        Ok(self.inner.client.disable_second_factor().await?)
    }

    async fn require_unlocked(&self) -> SessionResult<String> {
        let core = self.inner.core.lock().await;
        match &core.state {
            SessionState::Unlocked(session) => Ok(session.username.clone()),
            SessionState::SignedOut => Err(SessionError::NotSignedIn),
            _ => Err(SessionError::VaultLocked),
        }
    }

    async fn ensure_signed_out(&self) -> SessionResult<()> {
        let core = self.inner.core.lock().await;
        match core.state {
            SessionState::SignedOut => Ok(()),
            _ => Err(SessionError::AlreadySignedIn),
        }
    }

    /// Whether the session installed at `epoch` is still the one in
    /// place and unlocked.
    async fn still_unlocked(&self, epoch: u64) -> bool {
        let core = self.inner.core.lock().await;
        core.installed_attempt == epoch && matches!(core.state, SessionState::Unlocked(_))
    }

    fn next_attempt(&self) -> u64 {
        self.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Install a completed attempt's unlocked session unless a newer
/// attempt landed first.
async fn install_session(
    inner: &Inner,
    seq: u64,
    session: UnlockedSession,
    event: AuditEvent,
) -> SessionResult<AuthOutcome> {
    let mut core = inner.core.lock().await;
    if seq <= core.installed_attempt {
        tracing::debug!("discarding superseded login result");
        restore_token(inner, &core);
        return outcome_for_current(&core);
    }

    core.installed_attempt = seq;
    inner.client.set_session_token(Some(session.token.clone()));
    core.state = SessionState::Unlocked(session);
    arm_deadline(inner);
    inner.audit.record(event);
    Ok(AuthOutcome::Unlocked)
}

/// Install a secret-verified unlock that still needs a second factor.
async fn install_pending(
    inner: &Inner,
    seq: u64,
    pending: PendingUnlock,
) -> SessionResult<AuthOutcome> {
    let mut core = inner.core.lock().await;
    if seq <= core.installed_attempt {
        tracing::debug!("discarding superseded unlock result");
        restore_token(inner, &core);
        return outcome_for_current(&core);
    }

    core.installed_attempt = seq;
    core.state = SessionState::AwaitingSecondFactor(pending);
    Ok(AuthOutcome::SecondFactorRequired)
}

/// What a superseded attempt should report, based on whatever newer
/// state is in place.
fn outcome_for_current(core: &SessionCore) -> SessionResult<AuthOutcome> {
    match &core.state {
        SessionState::Unlocked(_) => Ok(AuthOutcome::Unlocked),
        SessionState::AwaitingSecondFactor(_) => Ok(AuthOutcome::SecondFactorRequired),
        SessionState::Locked(_) => Err(SessionError::VaultLocked),
        SessionState::SignedOut => Err(SessionError::NotSignedIn),
    }
}

/// Re-assert the token belonging to the authoritative state after a
/// stale attempt's auto-installed token may have clobbered it.
fn restore_token(inner: &Inner, core: &SessionCore) {
    match &core.state {
        SessionState::Unlocked(session) => {
            inner.client.set_session_token(Some(session.token.clone()));
        }
        _ => inner.client.set_session_token(None),
    }
}

/// Put the token slot back in line with the installed state after a
/// sign-in attempt failed past authentication. The attempt's login
/// auto-installed a token, and a machine that never signed in must
/// not keep one.
async fn discard_attempt_token(inner: &Inner) {
    let core = inner.core.lock().await;
    restore_token(inner, &core);
}

async fn apply_lock(inner: &Inner, reason: LockReason) -> SessionResult<()> {
    let mut core = inner.core.lock().await;

    // Deadline writes all happen under the core lock, so this settles
    // the wake-up-versus-re-arm race: an activity event that re-armed
    // the countdown just before the watchdog got here wins.
    if reason == LockReason::IdleTimeout {
        let due = matches!(*inner.deadline.borrow(), Some(d) if d <= Instant::now());
        if !due {
            return Ok(());
        }
    }

    let (username, sealed) = match &core.state {
        SessionState::Unlocked(session) => (session.username.clone(), session.sealed.clone()),
        SessionState::AwaitingSecondFactor(pending) if reason == LockReason::Manual => {
            (pending.username.clone(), pending.sealed.clone())
        }
        SessionState::AwaitingSecondFactor(_) | SessionState::Locked(_) => return Ok(()),
        SessionState::SignedOut => return Err(SessionError::NotSignedIn),
    };

    core.installed_attempt = inner.attempts.load(Ordering::Relaxed);
    core.state = SessionState::Locked(LockedSession { username, sealed });
    let _ = inner.deadline.send(None);
    inner.client.logout();
    inner.audit.record(AuditEvent::Locked { reason });
    Ok(())
}

fn arm_deadline(inner: &Inner) {
    let _ = inner
        .deadline
        .send(Some(Instant::now() + inner.config.idle_timeout));
}

/// Single long-lived task owning the idle countdown. Re-arming goes
/// through the watch channel, so a new deadline atomically supersedes
/// the old one and two countdowns can never race.
async fn run_idle_watchdog(inner: Weak<Inner>, mut deadline_rx: watch::Receiver<Option<Instant>>) {
    loop {
        let target = *deadline_rx.borrow_and_update();
        match target {
            Some(deadline) => {
                tokio::select! {
                    _ = time::sleep_until(deadline) => {
                        let Some(inner) = inner.upgrade() else { break };
                        let _ = apply_lock(&inner, LockReason::IdleTimeout).await;
                    }
                    changed = deadline_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            None => {
                if deadline_rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn run_event_pump(inner: Weak<Inner>, mut events: mpsc::UnboundedReceiver<HostEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else { break };
        handle_host_event(&inner, event).await;
    }
}

async fn handle_host_event(inner: &Inner, event: HostEvent) {
    match event {
        HostEvent::Activity | HostEvent::Foregrounded => {
            let core = inner.core.lock().await;
            if matches!(core.state, SessionState::Unlocked(_)) {
                arm_deadline(inner);
            }
        }
        HostEvent::Backgrounded => {
            tracing::debug!("backgrounded, idle countdown continues");
        }
    }
}

async fn unseal_off_thread(
    sealed: SealedVault,
    secret: Zeroizing<String>,
) -> Result<CredentialCollection, VaultError> {
    tokio::task::spawn_blocking(move || unseal(&sealed, secret.as_bytes()))
        .await
        .map_err(|_| VaultError::Crypto(CryptoError::DerivationFailure))?
}

async fn seal_off_thread(
    collection: CredentialCollection,
    secret: Zeroizing<String>,
) -> Result<SealedVault, VaultError> {
    tokio::task::spawn_blocking(move || seal(&collection, secret.as_bytes()))
        .await
        .map_err(|_| VaultError::Crypto(CryptoError::DerivationFailure))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_protocol::testing::InMemoryAuthority;

    fn controller() -> SessionController {
        let authority = Arc::new(InMemoryAuthority::new());
        SessionController::new(AuthClient::new(authority), SessionConfig::default())
    }

    #[tokio::test]
    async fn test_starts_signed_out() {
        let controller = controller();
        assert_eq!(controller.lock_state().await, LockState::SignedOut);
    }

    #[tokio::test]
    async fn test_operations_refused_without_session() {
        let controller = controller();

        assert!(matches!(
            controller.credentials().await,
            Err(SessionError::NotSignedIn)
        ));
        assert!(matches!(
            controller.update_credentials(|_| {}).await,
            Err(SessionError::NotSignedIn)
        ));
        assert!(matches!(
            controller.unlock("secret").await,
            Err(SessionError::NotSignedIn)
        ));
        assert!(matches!(
            controller.lock().await,
            Err(SessionError::NotSignedIn)
        ));
        assert!(matches!(
            controller.enroll_second_factor().await,
            Err(SessionError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_second_factor_challenge_requires_pending_state() {
        let controller = controller();

        assert!(matches!(
            controller.submit_second_factor("123456").await,
            Err(SessionError::NoPendingChallenge)
        ));
        assert!(matches!(
            controller.cancel_second_factor().await,
            Err(SessionError::NoPendingChallenge)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let controller = controller();
        assert!(controller.sign_out().await.is_ok());
        assert!(controller.sign_out().await.is_ok());
        assert!(controller.audit_entries().is_empty());
    }
}
