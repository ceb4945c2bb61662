//! Request and response bodies exchanged with the remote authority.
//!
//! Field names here are the wire contract; salts, nonces, verifiers
//! and ciphertext all travel as lowercase hex.

use serde::{Deserialize, Serialize};
use vellum_vault::VaultBlob;

/// `GET /auth_salt/{username}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaltResponse {
    /// Hex-encoded 16-byte authentication salt.
    pub salt: String,
}

/// `POST /register` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Account name being claimed.
    pub username: String,
    /// Hex-encoded 16-byte authentication salt, generated client-side.
    pub salt: String,
    /// Hex-encoded 32-byte verifier derived from the secret.
    pub verifier: String,
}

/// `POST /login` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Hex-encoded 32-byte verifier derived from the secret.
    pub verifier: String,
}

/// `POST /login/mfa` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaLoginRequest {
    /// Account name.
    pub username: String,
    /// Hex-encoded 32-byte verifier derived from the secret.
    pub verifier: String,
    /// Six-digit code from the registered authenticator.
    pub mfa_code: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque session token for subsequent authenticated calls.
    pub token: String,
}

/// `GET /mfa/status/{username}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaStatusResponse {
    /// Whether the account has a second factor enrolled.
    pub mfa_enabled: bool,
}

/// `POST /mfa/setup` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaSetupResponse {
    /// Shared secret to load into an authenticator app.
    pub secret: String,
    /// Provisioning URI, suitable for rendering as a QR code.
    pub qr_code: String,
    /// One-time recovery codes.
    pub backup_codes: Vec<String>,
}

/// `POST /mfa/verify` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaVerifyRequest {
    /// Account name.
    pub username: String,
    /// Code being checked against the enrolled authenticator.
    pub code: String,
}

/// Envelope for `GET /vault` and `POST /vault`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultEnvelope {
    /// The sealed vault in its hex wire form.
    pub blob: VaultBlob,
}
