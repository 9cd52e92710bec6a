mod inspector;
mod refresh;

pub use inspector::{TokenClaims, decode_claims, expiry_epoch_seconds, seconds_remaining};
pub use refresh::RefreshCoordinator;
