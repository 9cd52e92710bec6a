//! console_session - Session and credential lifecycle management for the
//! operator back-office console.
//!
//! This crate owns the client-side authentication state machine (password →
//! optional second factor → optional enrollment), the stored credential
//! pair, and the session expiry monitor: the countdown that escalates
//! through warning levels, renews the token opportunistically while the
//! operator is active, and forces logout when time runs out.

use std::sync::Arc;

mod api;
mod config;
mod credentials;
mod monitor;
mod session;
#[cfg(test)]
mod test_utils;
mod token;
mod utils;

pub use api::{
    ApiError, AuthApi, HttpAuthApi, LoginOutcome, LoginRequest, SecuritySettings, TwoFactorMethod,
    TwoFactorVerifyRequest, VerifyOutcome,
};
pub use config::{API_BASE_URL, BRAND_ID, ORIGIN};
pub use credentials::{
    Credential, CredentialError, CredentialStorage, CredentialStore, InMemoryCredentialStorage,
    UserProfile,
};
pub use monitor::{
    ExpiryMonitor, ExtendOutcome, SESSION_CRITICAL_SECS, SESSION_FINAL_SECS, SESSION_WARN_SECS,
    SessionClock, WarningLevel,
};
pub use session::{AuthController, AuthError, AuthPhase, LoginFlow};
pub use token::{RefreshCoordinator, TokenClaims, decode_claims, expiry_epoch_seconds, seconds_remaining};

/// Construct the fully wired session service with the HTTP API client and
/// in-memory credential storage.
pub fn init() -> Result<Arc<AuthController>, ApiError> {
    let api = Arc::new(HttpAuthApi::new()?);
    Ok(build(api))
}

/// Wire the controller, store, refresher, and monitor around a
/// caller-supplied API implementation. Each call builds an independent
/// service instance.
pub fn build(api: Arc<dyn AuthApi>) -> Arc<AuthController> {
    build_with_store(api, Arc::new(CredentialStore::in_memory()))
}

/// Like [`build`], with a caller-supplied credential store (e.g. one backed
/// by the shell's persistent storage).
pub fn build_with_store(api: Arc<dyn AuthApi>, store: Arc<CredentialStore>) -> Arc<AuthController> {
    let refresher = Arc::new(RefreshCoordinator::new(api.clone(), store.clone()));
    let monitor = ExpiryMonitor::new(store.clone(), refresher, api.clone());
    AuthController::new(api, store, monitor)
}
