use std::fmt;

use super::config::{SESSION_CRITICAL_SECS, SESSION_WARN_SECS};

/// Escalating urgency classification of the remaining session time. Drives
/// UI prominence, not just a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningLevel {
    None,
    Warning,
    Critical,
    Expired,
}

impl WarningLevel {
    /// Classify a remaining-seconds reading against the configured
    /// thresholds.
    pub fn for_remaining(remaining: u64) -> Self {
        Self::for_remaining_with(remaining, *SESSION_WARN_SECS, *SESSION_CRITICAL_SECS)
    }

    pub(crate) fn for_remaining_with(remaining: u64, warn: u64, critical: u64) -> Self {
        if remaining == 0 {
            Self::Expired
        } else if remaining <= critical {
            Self::Critical
        } else if remaining <= warn {
            Self::Warning
        } else {
            Self::None
        }
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Expired => "expired",
        };
        write!(f, "{name}")
    }
}

/// Snapshot of the countdown the shell renders. Derived state: always
/// re-derivable from the stored token's expiry claim plus the wall clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    pub remaining_seconds: u64,
    pub warning_level: WarningLevel,
    pub seconds_since_activity: u64,
}
