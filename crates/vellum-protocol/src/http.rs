//! HTTP transport implementing [`RemoteAuthority`].

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use vellum_crypto::SALT_SIZE;
use vellum_vault::VaultBlob;

use crate::authority::RemoteAuthority;
use crate::config::ClientConfig;
use crate::error::{ProtocolError, ProtocolResult};
use crate::wire::{
    LoginRequest, MfaLoginRequest, MfaSetupResponse, MfaStatusResponse, MfaVerifyRequest,
    RegisterRequest, SaltResponse, TokenResponse, VaultEnvelope,
};

/// HTTP client for the remote authority.
///
/// Holds the session token behind a lock so one instance can be
/// shared across concurrent operations; the token is attached as a
/// plain `Authorization` header value on every request while set.
pub struct HttpAuthority {
    client: Client,
    base_url: String,
    session_token: RwLock<Option<String>>,
}

#[derive(serde::Deserialize, Debug)]
struct ServerErrorBody {
    detail: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

fn read_token(lock: &RwLock<Option<String>>) -> RwLockReadGuard<'_, Option<String>> {
    lock.read().unwrap_or_else(|poisoned| {
        tracing::warn!("session token lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

fn write_token(lock: &RwLock<Option<String>>) -> RwLockWriteGuard<'_, Option<String>> {
    lock.write().unwrap_or_else(|poisoned| {
        tracing::warn!("session token lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

impl HttpAuthority {
    /// Build a client for the authority at `config.base_url`.
    pub fn new(config: &ClientConfig) -> ProtocolResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|_| ProtocolError::ServerUnreachable)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_token: RwLock::new(None),
        })
    }

    /// The authority base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Option<String> {
        read_token(&self.session_token).clone()
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ProtocolResult<T> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30);
            return Err(ProtocolError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ProtocolError::Network(e.to_string()));
        }

        let code = status.as_u16();
        let body = response.json::<ServerErrorBody>().await.ok();
        let msg = body
            .and_then(|b| b.detail.or(b.error).or(b.message))
            .unwrap_or_else(|| format!("HTTP {code}"));

        Err(classify_status(code, &msg))
    }

    async fn handle_empty_response(&self, response: Response) -> ProtocolResult<()> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30);
            return Err(ProtocolError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if status.is_success() {
            return Ok(());
        }

        let code = status.as_u16();
        let body = response.json::<ServerErrorBody>().await.ok();
        let msg = body
            .and_then(|b| b.detail.or(b.error).or(b.message))
            .unwrap_or_else(|| format!("HTTP {code}"));

        Err(classify_status(code, &msg))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ProtocolResult<T> {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = self.token() {
            req = req.header("Authorization", token);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ProtocolResult<T> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = self.token() {
            req = req.header("Authorization", token);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> ProtocolResult<()> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = self.token() {
            req = req.header("Authorization", token);
        }
        let resp = req.send().await?;
        self.handle_empty_response(resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ProtocolResult<T> {
        let mut req = self.client.post(self.url(path));
        if let Some(token) = self.token() {
            req = req.header("Authorization", token);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn post_empty_no_content(&self, path: &str) -> ProtocolResult<()> {
        let mut req = self.client.post(self.url(path));
        if let Some(token) = self.token() {
            req = req.header("Authorization", token);
        }
        let resp = req.send().await?;
        self.handle_empty_response(resp).await
    }

    fn require_token(&self) -> ProtocolResult<()> {
        if self.token().is_none() {
            return Err(ProtocolError::NotAuthenticated);
        }
        Ok(())
    }
}

fn classify_status(code: u16, msg: &str) -> ProtocolError {
    match code {
        400 | 401 => ProtocolError::InvalidCredentials,
        403 => {
            if msg.to_lowercase().contains("mfa") {
                ProtocolError::MfaRequired
            } else {
                ProtocolError::InvalidCredentials
            }
        }
        404 => ProtocolError::NotFound,
        409 => ProtocolError::UsernameTaken,
        _ => ProtocolError::Network(format!("HTTP {code}: {msg}")),
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn fetch_auth_salt(&self, username: &str) -> ProtocolResult<[u8; SALT_SIZE]> {
        let response: SaltResponse = self.get(&format!("/auth_salt/{username}")).await?;
        let bytes = hex::decode(&response.salt)
            .map_err(|_| ProtocolError::Network("malformed salt in response".into()))?;
        bytes
            .try_into()
            .map_err(|_| ProtocolError::Network("malformed salt in response".into()))
    }

    async fn submit_registration(&self, request: RegisterRequest) -> ProtocolResult<()> {
        self.post_no_content("/register", &request).await
    }

    async fn submit_login(&self, request: LoginRequest) -> ProtocolResult<String> {
        let response: TokenResponse = self.post("/login", &request).await?;
        Ok(response.token)
    }

    async fn submit_mfa_login(&self, request: MfaLoginRequest) -> ProtocolResult<String> {
        let response: TokenResponse = self.post("/login/mfa", &request).await?;
        Ok(response.token)
    }

    async fn fetch_mfa_status(&self, username: &str) -> ProtocolResult<bool> {
        let response: MfaStatusResponse = self.get(&format!("/mfa/status/{username}")).await?;
        Ok(response.mfa_enabled)
    }

    async fn begin_mfa_enrollment(&self) -> ProtocolResult<MfaSetupResponse> {
        self.require_token()?;
        self.post_empty("/mfa/setup").await
    }

    async fn confirm_mfa_code(&self, request: MfaVerifyRequest) -> ProtocolResult<()> {
        self.post_no_content("/mfa/verify", &request).await
    }

    async fn disable_mfa(&self) -> ProtocolResult<()> {
        self.require_token()?;
        self.post_empty_no_content("/mfa/disable").await
    }

    async fn fetch_vault(&self) -> ProtocolResult<VaultBlob> {
        self.require_token()?;
        let envelope: VaultEnvelope = self.get("/vault").await?;
        Ok(envelope.blob)
    }

    async fn store_vault(&self, blob: VaultBlob) -> ProtocolResult<()> {
        self.require_token()?;
        self.post_no_content("/vault", &VaultEnvelope { blob }).await
    }

    fn set_session_token(&self, token: Option<String>) {
        *write_token(&self.session_token) = token;
    }

    fn session_token(&self) -> Option<String> {
        self.token()
    }
}
