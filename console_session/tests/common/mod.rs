//! Shared fixtures for the integration suites: a scriptable `AuthApi`
//! double and signed-token minting.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Once};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use console_session::{
    ApiError, AuthApi, LoginOutcome, LoginRequest, SecuritySettings, TwoFactorVerifyRequest,
    UserProfile, VerifyOutcome,
};

/// Load test environment configuration once per process, preferring
/// `.env_test` over `.env`.
pub fn init_test_env() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }
    });
}

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    exp: i64,
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be past the epoch")
        .as_secs() as i64
}

/// Mint a real signed token expiring `ttl_secs` from now.
pub fn mint_token(ttl_secs: i64) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &TestClaims {
            sub: "op-1".to_string(),
            exp: now_epoch() + ttl_secs,
        },
        &jsonwebtoken::EncodingKey::from_secret(b"integration-test-secret"),
    )
    .expect("test token should encode")
}

pub fn sample_profile() -> UserProfile {
    UserProfile {
        id: "op-1".to_string(),
        label: "Night Shift".to_string(),
        email: "ops@example.com".to_string(),
        is_admin: false,
        allowed_pages: vec!["dashboard".to_string(), "reports".to_string()],
    }
}

/// Scriptable [`AuthApi`] double for driving the service end to end.
pub struct ScriptedApi {
    pub login_outcome: Mutex<Option<LoginOutcome>>,
    pub verify_outcomes: Mutex<VecDeque<VerifyOutcome>>,
    pub refresh_token: Mutex<Option<String>>,
    pub refresh_fails: bool,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub session_timeout_minutes: u64,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            login_outcome: Mutex::new(None),
            verify_outcomes: Mutex::new(VecDeque::new()),
            refresh_token: Mutex::new(None),
            refresh_fails: false,
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            session_timeout_minutes: 30,
        }
    }

    pub fn with_login_outcome(self, outcome: LoginOutcome) -> Self {
        Self {
            login_outcome: Mutex::new(Some(outcome)),
            ..self
        }
    }

    pub fn with_verify_outcomes(self, outcomes: Vec<VerifyOutcome>) -> Self {
        Self {
            verify_outcomes: Mutex::new(outcomes.into()),
            ..self
        }
    }

    pub fn with_refresh_token(self, token: String) -> Self {
        Self {
            refresh_token: Mutex::new(Some(token)),
            ..self
        }
    }

    pub fn with_refresh_error(self) -> Self {
        Self {
            refresh_fails: true,
            ..self
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl AuthApi for ScriptedApi {
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
        if self.refresh_fails {
            return Err(ApiError::Status(500));
        }
        Ok(self.refresh_token.lock().await.clone())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn security_settings(&self, _brand_id: &str) -> Result<SecuritySettings, ApiError> {
        Ok(SecuritySettings {
            session_timeout: self.session_timeout_minutes,
        })
    }
}

/// Let already-woken tasks run to completion.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock one second at a time so every scheduled task
/// observes every tick.
pub async fn pass_seconds(n: u64) {
    settle().await;
    for _ in 0..n {
        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        settle().await;
    }
}
