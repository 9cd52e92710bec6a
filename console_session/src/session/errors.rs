use thiserror::Error;

use crate::api::{ApiError, TwoFactorMethod};
use crate::credentials::CredentialError;

/// Errors surfaced by the authentication session controller. Expected,
/// recoverable rejections carry operator-facing messages; transport and
/// storage failures wrap the underlying error.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server rejected the password credentials; carries the server's
    /// message verbatim.
    #[error("{0}")]
    LoginRejected(String),

    /// Wrong or expired second-factor code for the given method.
    #[error("{}", .0.invalid_code_message())]
    InvalidSecondFactorCode(TwoFactorMethod),

    /// The chosen second-factor method cannot verify right now.
    #[error("{}", .0.unavailable_message())]
    SecondFactorUnavailable(TwoFactorMethod),

    /// Operation is not valid in the current authentication phase.
    #[error("Not in the required authentication state")]
    InvalidPhase,

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

impl AuthError {
    /// Log the error and return self, allowing method chaining at the call
    /// site that decides to surface it.
    pub fn log(self) -> Self {
        match &self {
            Self::LoginRejected(msg) => tracing::warn!("Login rejected: {}", msg),
            Self::InvalidSecondFactorCode(method) => {
                tracing::warn!("Second-factor code rejected for method {}", method)
            }
            Self::SecondFactorUnavailable(method) => {
                tracing::warn!("Second-factor method {} unavailable", method)
            }
            Self::InvalidPhase => tracing::error!("Operation invalid in current auth phase"),
            Self::Api(err) => tracing::error!("API error: {}", err),
            Self::Credential(err) => tracing::error!("Credential error: {}", err),
        }
        self
    }
}
