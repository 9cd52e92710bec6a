use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::{API_BASE_URL, ORIGIN};

use super::errors::ApiError;
use super::types::{
    LoginOutcome, LoginRequest, LoginResponseWire, RefreshResponseWire, SecuritySettings,
    TwoFactorVerifyRequest, VerifyOutcome, VerifyResponseWire,
};

/// Backend operations the session core depends on.
///
/// The console shell injects the HTTP implementation; tests inject doubles.
#[async_trait]
pub trait AuthApi: Send + Sync + 'static {
    /// `POST /login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, ApiError>;

    /// `POST /auth/2fa/verify`
    async fn verify_two_factor(
        &self,
        request: &TwoFactorVerifyRequest,
    ) -> Result<VerifyOutcome, ApiError>;

    /// `POST <origin>/refresh`. Returns the renewed token, or `None` when the
    /// response carried no token.
    async fn refresh(&self) -> Result<Option<String>, ApiError>;

    /// `POST /auth/logout`. Best-effort; the caller ignores failures.
    async fn logout(&self) -> Result<(), ApiError>;

    /// `GET /settings/security?brand_id=...`
    async fn security_settings(&self, brand_id: &str) -> Result<SecuritySettings, ApiError>;
}

/// `reqwest`-backed API client.
///
/// Keeps a cookie jar: the refresh endpoint authenticates with an ambient
/// cookie rather than the expiring access token.
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
    origin: String,
}

impl HttpAuthApi {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_urls(API_BASE_URL.clone(), ORIGIN.clone())
    }

    pub fn with_base_urls(
        base_url: impl Into<String>,
        origin: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            origin: origin.into(),
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, ApiError> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ApiError::Status(status.as_u16()));
        }

        // Rejections come back with the same wire shape as successes, so the
        // body is decoded regardless of the status code.
        let wire: LoginResponseWire = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        LoginOutcome::try_from(wire)
    }

    async fn verify_two_factor(
        &self,
        request: &TwoFactorVerifyRequest,
    ) -> Result<VerifyOutcome, ApiError> {
        let response = self
            .client
            .post(format!("{}/auth/2fa/verify", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(VerifyOutcome::MethodUnavailable);
        }

        let wire: VerifyResponseWire = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        match wire.access_token {
            Some(access_token) if status.is_success() => {
                Ok(VerifyOutcome::Verified { access_token })
            }
            _ if wire.code.as_deref() == Some("method_unavailable") => {
                Ok(VerifyOutcome::MethodUnavailable)
            }
            _ if status.is_client_error() => Ok(VerifyOutcome::InvalidCode),
            _ => Err(ApiError::Status(status.as_u16())),
        }
    }

    async fn refresh(&self) -> Result<Option<String>, ApiError> {
        let response = self
            .client
            .post(format!("{}/refresh", self.origin))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let wire: RefreshResponseWire = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(wire.access_token)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/auth/logout", self.base_url))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn security_settings(&self, brand_id: &str) -> Result<SecuritySettings, ApiError> {
        let response = self
            .client
            .get(format!("{}/settings/security", self.base_url))
            .query(&[("brand_id", brand_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let settings: SecuritySettings = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(settings)
    }
}
