//! Timing configuration for the session expiry monitor.
//!
//! Thresholds are configuration, not structure; deployments tune them per
//! environment.

use std::sync::LazyLock;

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Remaining seconds at or below which the warning level becomes `Warning`.
pub static SESSION_WARN_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("SESSION_WARN_SECS", 600));

/// Remaining seconds at or below which the warning level becomes `Critical`.
pub static SESSION_CRITICAL_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("SESSION_CRITICAL_SECS", 300));

/// Inside the critical band, the point where tick logging escalates.
pub static SESSION_FINAL_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("SESSION_FINAL_SECS", 60));

/// Quiet period after the last activity signal before the countdown re-arms.
pub(crate) static ACTIVITY_DEBOUNCE_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("ACTIVITY_DEBOUNCE_SECS", 2));

/// Minimum age of the previous arm before activity may re-arm the countdown.
pub(crate) static REARM_MIN_INTERVAL_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("REARM_MIN_INTERVAL_SECS", 10));

/// Cadence of the opportunistic auto-refresh check.
pub(crate) static AUTO_REFRESH_POLL_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("AUTO_REFRESH_POLL_SECS", 30));

/// How recently the operator must have been active for auto-refresh to run.
pub(crate) static ACTIVITY_GRACE_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("ACTIVITY_GRACE_SECS", 300));

/// Remaining-time band that makes the session eligible for auto-refresh.
pub(crate) static AUTO_REFRESH_BAND_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("AUTO_REFRESH_BAND_SECS", 300));

/// Allowed divergence between the local countdown and the token-derived one
/// before the tick snaps to the token.
pub(crate) static RESYNC_TOLERANCE_SECS: LazyLock<u64> =
    LazyLock::new(|| env_u64("RESYNC_TOLERANCE_SECS", 5));

/// Fallback session length when neither a token nor server settings are
/// available at arming time.
pub(crate) static DEFAULT_SESSION_TIMEOUT_MINUTES: LazyLock<u64> =
    LazyLock::new(|| env_u64("DEFAULT_SESSION_TIMEOUT_MINUTES", 30));
