mod clock;
mod config;
mod expiry;

pub use clock::{SessionClock, WarningLevel};
pub use config::{SESSION_CRITICAL_SECS, SESSION_FINAL_SECS, SESSION_WARN_SECS};
pub use expiry::{ExpiryMonitor, ExtendOutcome};
