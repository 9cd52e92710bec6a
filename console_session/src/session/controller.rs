use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use crate::api::{
    AuthApi, LoginOutcome, LoginRequest, TwoFactorMethod, TwoFactorVerifyRequest, VerifyOutcome,
};
use crate::credentials::{Credential, CredentialStore, UserProfile};
use crate::monitor::ExpiryMonitor;

use super::errors::AuthError;
use super::types::{AuthPhase, LoginFlow, SessionEnd};

/// Owner of the login / second-factor / enrollment state machine.
///
/// The expiry monitor is armed on every transition into `Authenticated` and
/// torn down on every path out of it; the shell never starts or stops the
/// monitor directly.
pub struct AuthController {
    api: Arc<dyn AuthApi>,
    store: Arc<CredentialStore>,
    monitor: Arc<ExpiryMonitor>,
    phase: Mutex<AuthPhase>,
}

impl AuthController {
    /// Wire a controller around its collaborators. The monitor's expiry
    /// handler is bound to a weak reference of the controller so a zero-time
    /// tick funnels into the forced-logout path without an Arc cycle.
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<CredentialStore>,
        monitor: Arc<ExpiryMonitor>,
    ) -> Arc<Self> {
        let controller = Arc::new(Self {
            api,
            store,
            monitor: monitor.clone(),
            phase: Mutex::new(AuthPhase::Unauthenticated),
        });

        let weak: Weak<AuthController> = Arc::downgrade(&controller);
        monitor.set_expired_handler(Box::new(move || {
            if let Some(controller) = weak.upgrade() {
                tokio::spawn(async move {
                    controller.end_session(SessionEnd::Expired).await;
                });
            }
        }));

        controller
    }

    /// Submit the operator's password credentials.
    pub async fn login(
        &self,
        login_id: &str,
        password: &str,
        remember: bool,
    ) -> Result<LoginFlow, AuthError> {
        let request = LoginRequest {
            login_id: login_id.to_string(),
            password: password.to_string(),
        };
        let outcome = self.api.login(&request).await?;

        if !matches!(outcome, LoginOutcome::Rejected { .. }) {
            self.store.set_remember(remember).await?;
        }

        let mut phase = self.phase.lock().await;
        match outcome {
            LoginOutcome::SignedIn {
                access_token,
                profile,
            } => {
                self.commit(&mut phase, access_token, profile).await?;
                Ok(LoginFlow::SignedIn)
            }
            LoginOutcome::SecondFactorRequired { profile, methods } => {
                tracing::info!(user_id = %profile.id, "Second factor required");
                *phase = AuthPhase::PendingSecondFactor {
                    profile,
                    methods: methods.clone(),
                };
                Ok(LoginFlow::SecondFactorRequired { methods })
            }
            LoginOutcome::EnrollmentRequired { profile } => {
                tracing::info!(user_id = %profile.id, "Second factor enrollment required");
                *phase = AuthPhase::PendingSecondFactorEnrollment { profile };
                Ok(LoginFlow::EnrollmentRequired)
            }
            LoginOutcome::Rejected { message } => {
                *phase = AuthPhase::Unauthenticated;
                Err(AuthError::LoginRejected(message).log())
            }
        }
    }

    /// Verify a second-factor code for the provisionally identified
    /// operator.
    ///
    /// A rejection leaves the pending state untouched so the operator may
    /// retry or switch methods.
    pub async fn verify_second_factor(
        &self,
        code: &str,
        method: Option<TwoFactorMethod>,
    ) -> Result<(), AuthError> {
        let request = {
            let phase = self.phase.lock().await;
            let AuthPhase::PendingSecondFactor { profile, .. } = &*phase else {
                return Err(AuthError::InvalidPhase.log());
            };
            TwoFactorVerifyRequest {
                token: code.to_string(),
                user_id: profile.id.clone(),
                method,
            }
        };

        let outcome = self.api.verify_two_factor(&request).await?;

        let mut phase = self.phase.lock().await;
        // The operator may have abandoned the flow while the call was out
        let AuthPhase::PendingSecondFactor { profile, .. } = &*phase else {
            return Err(AuthError::InvalidPhase.log());
        };
        let profile = profile.clone();

        let reported_method = method.unwrap_or(TwoFactorMethod::Totp);
        match outcome {
            VerifyOutcome::Verified { access_token } => {
                self.commit(&mut phase, access_token, profile).await
            }
            VerifyOutcome::InvalidCode => {
                Err(AuthError::InvalidSecondFactorCode(reported_method).log())
            }
            VerifyOutcome::MethodUnavailable => {
                Err(AuthError::SecondFactorUnavailable(reported_method).log())
            }
        }
    }

    /// Accept the token obtained at the end of second-factor enrollment.
    ///
    /// Enrollment mechanics (secret generation, QR, backup codes) belong to
    /// an external collaborator; this only commits the result.
    pub async fn complete_enrollment(&self, access_token: &str) -> Result<(), AuthError> {
        let mut phase = self.phase.lock().await;
        let AuthPhase::PendingSecondFactorEnrollment { profile } = &*phase else {
            return Err(AuthError::InvalidPhase.log());
        };
        let profile = profile.clone();
        self.commit(&mut phase, access_token.to_string(), profile)
            .await
    }

    /// Abandon a pending second-factor flow without contacting the server.
    pub async fn reset_pending_states(&self) {
        let mut phase = self.phase.lock().await;
        if phase.is_pending() {
            tracing::debug!("Abandoning pending second-factor state");
            *phase = AuthPhase::Unauthenticated;
        }
    }

    /// End the session from any state.
    pub async fn logout(&self) {
        self.end_session(SessionEnd::OperatorLogout).await;
    }

    /// Shared teardown for operator logout and forced expiry. Local state
    /// clearing is authoritative; the server call is best-effort telemetry,
    /// never a gate on the local transition.
    pub(crate) async fn end_session(&self, reason: SessionEnd) {
        if let Err(err) = self.api.logout().await {
            tracing::warn!("Logout request failed: {}", err);
        }
        // Timers go first so no tick observes a cleared store
        self.monitor.teardown().await;
        if let Err(err) = self.store.clear().await {
            tracing::warn!("Failed to clear stored credential: {}", err);
        }

        let mut phase = self.phase.lock().await;
        *phase = AuthPhase::Unauthenticated;
        match reason {
            SessionEnd::OperatorLogout => tracing::info!("Operator logged out"),
            SessionEnd::Expired => tracing::info!("Session expired, operator logged out"),
        }
    }

    /// Snapshot of the current phase.
    pub async fn phase(&self) -> AuthPhase {
        self.phase.lock().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.phase.lock().await.is_authenticated()
    }

    /// The expiry monitor, for the shell's countdown indicator, activity
    /// signals, and the explicit extend action.
    pub fn monitor(&self) -> &Arc<ExpiryMonitor> {
        &self.monitor
    }

    async fn commit(
        &self,
        phase: &mut AuthPhase,
        access_token: String,
        profile: UserProfile,
    ) -> Result<(), AuthError> {
        let credential = Credential {
            token: access_token,
            profile: profile.clone(),
        };
        self.store.persist(&credential).await?;
        *phase = AuthPhase::Authenticated { profile };
        tracing::info!(user_id = %credential.profile.id, "Operator authenticated");
        self.monitor.arm().await;
        Ok(())
    }
}
