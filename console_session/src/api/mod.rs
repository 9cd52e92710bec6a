mod client;
mod errors;
mod types;

pub use client::{AuthApi, HttpAuthApi};
pub use errors::ApiError;
pub use types::{
    LoginOutcome, LoginRequest, SecuritySettings, TwoFactorMethod, TwoFactorVerifyRequest,
    VerifyOutcome,
};
