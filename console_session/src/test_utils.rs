//! Shared test doubles and fixtures for the crate's test modules.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, Notify};

use crate::api::{
    ApiError, AuthApi, LoginOutcome, LoginRequest, SecuritySettings, TwoFactorVerifyRequest,
    VerifyOutcome,
};
use crate::credentials::{Credential, UserProfile};

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    exp: i64,
}

/// Mint a real signed token expiring `ttl_secs` from now.
pub(crate) fn mint_token(ttl_secs: i64) -> String {
    mint_token_at(Utc::now().timestamp() + ttl_secs)
}

pub(crate) fn mint_token_at(exp: i64) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &TestClaims {
            sub: "op-1".to_string(),
            exp,
        },
        &jsonwebtoken::EncodingKey::from_secret(b"console-test-secret"),
    )
    .expect("test token should encode")
}

pub(crate) fn sample_profile() -> UserProfile {
    UserProfile {
        id: "op-1".to_string(),
        label: "Night Shift".to_string(),
        email: "ops@example.com".to_string(),
        is_admin: false,
        allowed_pages: vec!["dashboard".to_string(), "reports".to_string()],
    }
}

pub(crate) fn sample_credential(ttl_secs: i64) -> Credential {
    Credential {
        token: mint_token(ttl_secs),
        profile: sample_profile(),
    }
}

/// Scriptable [`AuthApi`] double.
pub(crate) struct MockAuthApi {
    pub(crate) login_outcome: Mutex<Option<LoginOutcome>>,
    pub(crate) verify_outcomes: Mutex<VecDeque<VerifyOutcome>>,
    pub(crate) refresh_token: Mutex<Option<String>>,
    pub(crate) refresh_fails: bool,
    pub(crate) refresh_gate: Option<Arc<Notify>>,
    pub(crate) refresh_entered: Arc<Notify>,
    pub(crate) refresh_calls: AtomicUsize,
    pub(crate) logout_calls: AtomicUsize,
    pub(crate) logout_fails: bool,
    pub(crate) session_timeout_minutes: u64,
}

impl MockAuthApi {
    pub(crate) fn new() -> Self {
        Self {
            login_outcome: Mutex::new(None),
            verify_outcomes: Mutex::new(VecDeque::new()),
            refresh_token: Mutex::new(None),
            refresh_fails: false,
            refresh_gate: None,
            refresh_entered: Arc::new(Notify::new()),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            logout_fails: false,
            session_timeout_minutes: 30,
        }
    }

    pub(crate) fn with_login_outcome(self, outcome: LoginOutcome) -> Self {
        Self {
            login_outcome: Mutex::new(Some(outcome)),
            ..self
        }
    }

    pub(crate) fn with_verify_outcomes(self, outcomes: Vec<VerifyOutcome>) -> Self {
        Self {
            verify_outcomes: Mutex::new(outcomes.into()),
            ..self
        }
    }

    pub(crate) fn with_refresh_token(self, token: String) -> Self {
        Self {
            refresh_token: Mutex::new(Some(token)),
            ..self
        }
    }

    pub(crate) fn with_refresh_error(self) -> Self {
        Self {
            refresh_fails: true,
            ..self
        }
    }

    /// Park refresh calls on a gate so tests can hold one in flight.
    pub(crate) fn with_refresh_gate(self, gate: Arc<Notify>) -> Self {
        Self {
            refresh_gate: Some(gate),
            ..self
        }
    }

    pub(crate) fn with_logout_error(self) -> Self {
        Self {
            logout_fails: true,
            ..self
        }
    }

    pub(crate) fn with_session_timeout_minutes(self, minutes: u64) -> Self {
        Self {
            session_timeout_minutes: minutes,
            ..self
        }
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginOutcome, ApiError> {
        self.login_outcome
            .lock()
            .await
            .clone()
            .ok_or(ApiError::Status(500))
    }

    async fn verify_two_factor(
        &self,
        _request: &TwoFactorVerifyRequest,
    ) -> Result<VerifyOutcome, ApiError> {
        self.verify_outcomes
            .lock()
            .await
            .pop_front()
            .ok_or(ApiError::Status(500))
    }

    async fn refresh(&self) -> Result<Option<String>, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_entered.notify_one();
        if let Some(gate) = &self.refresh_gate {
            gate.notified().await;
        }
        if self.refresh_fails {
            return Err(ApiError::Status(500));
        }
        Ok(self.refresh_token.lock().await.clone())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails {
            return Err(ApiError::Status(502));
        }
        Ok(())
    }

    async fn security_settings(&self, _brand_id: &str) -> Result<SecuritySettings, ApiError> {
        Ok(SecuritySettings {
            session_timeout: self.session_timeout_minutes,
        })
    }
}
