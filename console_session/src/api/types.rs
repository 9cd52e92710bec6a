use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credentials::UserProfile;

use super::errors::ApiError;

/// Second-factor methods the backend can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoFactorMethod {
    /// Authenticator-app code
    Totp,
    /// One-time code delivered by email
    Email,
    /// One-time code delivered by SMS
    Sms,
    /// Single-use recovery code issued at enrollment
    BackupCodes,
    /// Possessor-bound cryptographic assertion
    Passkey,
}

impl TwoFactorMethod {
    pub fn invalid_code_message(&self) -> &'static str {
        match self {
            Self::Totp => "Invalid authenticator code",
            Self::Email => "Invalid email code",
            Self::Sms => "Invalid SMS code",
            Self::BackupCodes => "Invalid backup code",
            Self::Passkey => "Passkey verification failed",
        }
    }

    pub fn unavailable_message(&self) -> &'static str {
        match self {
            Self::Totp => "Authenticator verification is temporarily unavailable",
            Self::Email => "Email codes are temporarily unavailable",
            Self::Sms => "SMS codes are temporarily unavailable",
            Self::BackupCodes => "Backup codes are temporarily unavailable",
            Self::Passkey => "Passkey verification is temporarily unavailable",
        }
    }
}

impl fmt::Display for TwoFactorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Totp => "totp",
            Self::Email => "email",
            Self::Sms => "sms",
            Self::BackupCodes => "backup_codes",
            Self::Passkey => "passkey",
        };
        write!(f, "{name}")
    }
}

/// Request body for `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}

/// Raw login response. The optional fields signal which branch of the flow
/// applies; this shape is decoded exactly once, at the API boundary.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponseWire {
    pub access_token: Option<String>,
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub requires_2fa: bool,
    #[serde(default)]
    pub requires_2fa_setup: bool,
    #[serde(default)]
    pub available_2fa_methods: Vec<TwoFactorMethod>,
    pub allowed_pages: Option<Vec<String>>,
    pub error: Option<String>,
}

/// Decoded login outcome. The rest of the crate never inspects optional wire
/// fields.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    SignedIn {
        access_token: String,
        profile: UserProfile,
    },
    SecondFactorRequired {
        profile: UserProfile,
        methods: Vec<TwoFactorMethod>,
    },
    EnrollmentRequired {
        profile: UserProfile,
    },
    Rejected {
        message: String,
    },
}

impl TryFrom<LoginResponseWire> for LoginOutcome {
    type Error = ApiError;

    fn try_from(wire: LoginResponseWire) -> Result<Self, Self::Error> {
        let profile_for = |wire_profile: Option<UserProfile>,
                           allowed_pages: Option<Vec<String>>|
         -> Result<UserProfile, ApiError> {
            let mut profile = wire_profile
                .ok_or_else(|| ApiError::Decode("login response missing user_profile".to_string()))?;
            if let Some(pages) = allowed_pages {
                profile.allowed_pages = pages;
            }
            Ok(profile)
        };

        if wire.requires_2fa_setup {
            let profile = profile_for(wire.user_profile, wire.allowed_pages)?;
            return Ok(Self::EnrollmentRequired { profile });
        }

        if wire.requires_2fa {
            let profile = profile_for(wire.user_profile, wire.allowed_pages)?;
            return Ok(Self::SecondFactorRequired {
                profile,
                methods: wire.available_2fa_methods,
            });
        }

        if let Some(access_token) = wire.access_token {
            let profile = profile_for(wire.user_profile, wire.allowed_pages)?;
            return Ok(Self::SignedIn {
                access_token,
                profile,
            });
        }

        Ok(Self::Rejected {
            message: wire
                .error
                .unwrap_or_else(|| "Login failed".to_string()),
        })
    }
}

/// Request body for `POST /auth/2fa/verify`. `token` carries the submitted
/// code or assertion.
#[derive(Debug, Clone, Serialize)]
pub struct TwoFactorVerifyRequest {
    pub token: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<TwoFactorMethod>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyResponseWire {
    pub access_token: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Decoded verification outcome. Rejections are expected states, not errors.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Verified { access_token: String },
    InvalidCode,
    MethodUnavailable,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponseWire {
    pub access_token: Option<String>,
}

/// `GET /settings/security` payload; `session_timeout` is minutes.
#[derive(Debug, Clone, Deserialize)]
pub struct SecuritySettings {
    pub session_timeout: u64,
}
