mod controller;
mod errors;
mod types;

pub use controller::AuthController;
pub use errors::AuthError;
pub use types::{AuthPhase, LoginFlow};
