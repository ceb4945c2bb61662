//! The wire seam between the protocol client and the remote authority.

use async_trait::async_trait;

use vellum_crypto::SALT_SIZE;
use vellum_vault::VaultBlob;

use crate::error::ProtocolResult;
use crate::wire::{
    LoginRequest, MfaLoginRequest, MfaSetupResponse, MfaVerifyRequest, RegisterRequest,
};

/// One remote authority endpoint set.
///
/// Implementations map remote outcomes onto
/// [`ProtocolError`](crate::ProtocolError) uniformly: `NotFound` for
/// missing accounts or vaults, `InvalidCredentials` for rejected
/// verifiers and codes, `UsernameTaken` for registration conflicts,
/// and `RateLimited` with the server's wait whenever throttled.
/// [`HttpAuthority`](crate::HttpAuthority) is the production
/// implementation; the in-memory authority backs tests.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Fetch the authentication salt registered for `username`.
    async fn fetch_auth_salt(&self, username: &str) -> ProtocolResult<[u8; SALT_SIZE]>;

    /// Submit a new account's salt and verifier.
    async fn submit_registration(&self, request: RegisterRequest) -> ProtocolResult<()>;

    /// Submit a login verifier, receiving a session token on match.
    async fn submit_login(&self, request: LoginRequest) -> ProtocolResult<String>;

    /// Submit a login verifier plus second-factor code.
    async fn submit_mfa_login(&self, request: MfaLoginRequest) -> ProtocolResult<String>;

    /// Whether `username` has a second factor enrolled.
    async fn fetch_mfa_status(&self, username: &str) -> ProtocolResult<bool>;

    /// Begin second-factor enrollment for the authenticated account.
    async fn begin_mfa_enrollment(&self) -> ProtocolResult<MfaSetupResponse>;

    /// Confirm a second-factor code; `InvalidCredentials` means the
    /// code was rejected.
    async fn confirm_mfa_code(&self, request: MfaVerifyRequest) -> ProtocolResult<()>;

    /// Disable the authenticated account's second factor.
    async fn disable_mfa(&self) -> ProtocolResult<()>;

    /// Fetch the authenticated account's sealed vault; `NotFound`
    /// means none has been stored yet.
    async fn fetch_vault(&self) -> ProtocolResult<VaultBlob>;

    /// Replace the authenticated account's sealed vault.
    async fn store_vault(&self, blob: VaultBlob) -> ProtocolResult<()>;

    /// Install or clear the session token used by authenticated calls.
    fn set_session_token(&self, token: Option<String>);

    /// The currently installed session token, if any.
    fn session_token(&self) -> Option<String>;
}
