use crate::api::TwoFactorMethod;
use crate::credentials::UserProfile;

/// High-level authentication state of the console.
///
/// Transitions are one-directional except logout/reset, which return
/// unconditionally to `Unauthenticated`. The committed credential itself is
/// owned by the credential store; the authenticated phase carries only the
/// profile snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    /// Password accepted, waiting for a second-factor code. Carries the
    /// provisional operator and the methods the backend reports as
    /// available; no credential exists yet.
    PendingSecondFactor {
        profile: UserProfile,
        methods: Vec<TwoFactorMethod>,
    },
    /// Password accepted, but the operator must enroll a second factor
    /// before a session exists.
    PendingSecondFactorEnrollment { profile: UserProfile },
    Authenticated { profile: UserProfile },
}

impl AuthPhase {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::PendingSecondFactor { .. } | Self::PendingSecondFactorEnrollment { .. }
        )
    }
}

/// What the shell should do next after a login call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginFlow {
    SignedIn,
    SecondFactorRequired { methods: Vec<TwoFactorMethod> },
    EnrollmentRequired,
}

/// Why a session ended. Forced expiry and operator logout share the same
/// teardown path but are logged apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    OperatorLogout,
    Expired,
}
