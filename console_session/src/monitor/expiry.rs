use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::api::AuthApi;
use crate::config::BRAND_ID;
use crate::credentials::CredentialStore;
use crate::token::{RefreshCoordinator, seconds_remaining};

use super::clock::{SessionClock, WarningLevel};
use super::config::{
    ACTIVITY_DEBOUNCE_SECS, ACTIVITY_GRACE_SECS, AUTO_REFRESH_BAND_SECS, AUTO_REFRESH_POLL_SECS,
    DEFAULT_SESSION_TIMEOUT_MINUTES, REARM_MIN_INTERVAL_SECS, RESYNC_TOLERANCE_SECS,
    SESSION_FINAL_SECS,
};

/// Invoked when the countdown reaches zero; the controller wires this to its
/// forced-logout path.
pub(crate) type ExpiredHandler = Box<dyn Fn() + Send + Sync>;

/// Outcome of an explicit "extend session" operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendOutcome {
    /// The token was renewed and the countdown resynced.
    Extended,
    /// Renewal failed but time remains; only the zero-time tick forces
    /// logout.
    StillCritical,
    /// Renewal failed with no time left; the session was ended immediately.
    Expired,
}

#[derive(Debug)]
struct ClockState {
    running: bool,
    remaining: u64,
    warning: WarningLevel,
    last_activity: Instant,
    last_armed: Option<Instant>,
}

impl ClockState {
    fn idle() -> Self {
        Self {
            running: false,
            remaining: 0,
            warning: WarningLevel::None,
            last_activity: Instant::now(),
            last_armed: None,
        }
    }
}

#[derive(Default)]
struct ScheduledTasks {
    tick: Option<JoinHandle<()>>,
    poll: Option<JoinHandle<()>>,
    debounce: Option<JoinHandle<()>>,
}

impl ScheduledTasks {
    fn cancel_all(&mut self) {
        for handle in [self.tick.take(), self.poll.take(), self.debounce.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

/// Countdown, warning escalation, and renewal engine for the authenticated
/// session.
///
/// Runs only while the controller reports an authenticated operator. Every
/// path out of that state funnels through [`ExpiryMonitor::teardown`], so no
/// orphaned timer can fire against a cleared credential store.
pub struct ExpiryMonitor {
    store: Arc<CredentialStore>,
    refresher: Arc<RefreshCoordinator>,
    api: Arc<dyn AuthApi>,
    state: Mutex<ClockState>,
    tasks: Mutex<ScheduledTasks>,
    expired_handler: std::sync::Mutex<Option<ExpiredHandler>>,
    rearms: AtomicU64,
}

impl ExpiryMonitor {
    pub fn new(
        store: Arc<CredentialStore>,
        refresher: Arc<RefreshCoordinator>,
        api: Arc<dyn AuthApi>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            refresher,
            api,
            state: Mutex::new(ClockState::idle()),
            tasks: Mutex::new(ScheduledTasks::default()),
            expired_handler: std::sync::Mutex::new(None),
            rearms: AtomicU64::new(0),
        })
    }

    pub(crate) fn set_expired_handler(&self, handler: ExpiredHandler) {
        if let Ok(mut slot) = self.expired_handler.lock() {
            *slot = Some(handler);
        }
    }

    fn notify_expired(&self) {
        if let Ok(slot) = self.expired_handler.lock() {
            if let Some(handler) = slot.as_ref() {
                handler();
            }
        }
    }

    /// Initialize the countdown from the stored token and start the tick and
    /// auto-refresh schedules. Safe to call again; the previous schedules are
    /// replaced.
    pub async fn arm(self: &Arc<Self>) {
        let initial = match self.store.token().await {
            Some(token) => seconds_remaining(&token),
            None => {
                // Degraded mode: no token yet, size the countdown from the
                // server-configured session length.
                tracing::warn!("Arming expiry monitor without a stored token");
                self.fallback_session_secs().await
            }
        };

        {
            let mut state = self.state.lock().await;
            state.running = true;
            state.remaining = initial;
            state.warning = WarningLevel::for_remaining(initial);
            state.last_activity = Instant::now();
            state.last_armed = Some(Instant::now());
        }
        tracing::debug!(remaining = initial, "Expiry monitor armed");

        let mut tasks = self.tasks.lock().await;
        tasks.cancel_all();
        tasks.tick = Some(self.spawn_tick());
        tasks.poll = Some(self.spawn_poll());
    }

    async fn fallback_session_secs(&self) -> u64 {
        match self.api.security_settings(&BRAND_ID).await {
            Ok(settings) => settings.session_timeout * 60,
            Err(err) => {
                tracing::warn!("Failed to fetch security settings: {}", err);
                *DEFAULT_SESSION_TIMEOUT_MINUTES * 60
            }
        }
    }

    fn spawn_tick(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if !monitor.tick().await {
                    break;
                }
            }
        })
    }

    /// One countdown step. Returns `false` when the countdown has ended.
    async fn tick(self: &Arc<Self>) -> bool {
        // Always read the current stored token, not a cached copy: a
        // background refresh shows up here without any explicit push.
        let token_remaining = match self.store.token().await {
            Some(token) => seconds_remaining(&token),
            None => 0,
        };

        let mut state = self.state.lock().await;
        if !state.running {
            return false;
        }

        let local = state.remaining.saturating_sub(1);
        // Trust the local decrement for smooth seconds, but snap to the
        // token-derived value when the two drift apart (background refresh,
        // suspended machine, clock skew).
        let remaining = if token_remaining.abs_diff(local) > *RESYNC_TOLERANCE_SECS {
            tracing::debug!(
                local,
                token_remaining,
                "Countdown resynced to token expiry"
            );
            token_remaining
        } else {
            local
        };

        let crossed_final = state.remaining > *SESSION_FINAL_SECS
            && remaining <= *SESSION_FINAL_SECS
            && remaining > 0;
        if crossed_final {
            tracing::warn!(remaining, "Session in final expiry window");
        }

        state.remaining = remaining;
        state.warning = WarningLevel::for_remaining(remaining);

        if remaining == 0 {
            state.running = false;
            drop(state);
            tracing::info!("Session countdown reached zero, forcing logout");
            // The tick task ends itself; only the sibling schedules need
            // cancelling here.
            let mut tasks = self.tasks.lock().await;
            if let Some(handle) = tasks.poll.take() {
                handle.abort();
            }
            if let Some(handle) = tasks.debounce.take() {
                handle.abort();
            }
            tasks.tick = None;
            drop(tasks);
            self.notify_expired();
            return false;
        }
        true
    }

    fn spawn_poll(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(*AUTO_REFRESH_POLL_SECS));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                monitor.auto_refresh_check().await;
            }
        })
    }

    /// Renew opportunistically while the operator is around to benefit from
    /// it. A success shows up on the next tick via the token resync.
    async fn auto_refresh_check(&self) {
        let due = {
            let state = self.state.lock().await;
            state.running
                && state.remaining > 0
                && state.remaining <= *AUTO_REFRESH_BAND_SECS
                && state.last_activity.elapsed() <= Duration::from_secs(*ACTIVITY_GRACE_SECS)
        };
        if !due {
            return;
        }

        tracing::debug!("Auto-refresh window open, attempting token renewal");
        let refreshed = self.refresher.refresh().await;
        if !refreshed {
            tracing::debug!("Opportunistic refresh did not extend the session");
        }
    }

    /// Record an operator activity signal (pointer, keyboard, scroll,
    /// touch).
    ///
    /// The timestamp updates immediately; the countdown itself re-arms only
    /// after a quiet period, and never more often than the minimum re-arm
    /// interval.
    pub async fn note_activity(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            state.last_activity = Instant::now();
            if !state.running {
                return;
            }
        }

        let monitor = Arc::clone(self);
        let mut tasks = self.tasks.lock().await;
        // Each new signal replaces the pending re-arm, so a burst collapses
        // into one re-arm after the quiet period.
        if let Some(handle) = tasks.debounce.take() {
            handle.abort();
        }
        tasks.debounce = Some(tokio::spawn(async move {
            time::sleep(Duration::from_secs(*ACTIVITY_DEBOUNCE_SECS)).await;
            monitor.rearm_from_token().await;
        }));
    }

    /// Resnap the countdown to the stored token, honoring the minimum re-arm
    /// interval. Does not touch the running schedules.
    async fn rearm_from_token(&self) {
        let token_remaining = match self.store.token().await {
            Some(token) => seconds_remaining(&token),
            None => return,
        };

        let mut state = self.state.lock().await;
        if !state.running {
            return;
        }
        if let Some(last) = state.last_armed {
            if last.elapsed() < Duration::from_secs(*REARM_MIN_INTERVAL_SECS) {
                return;
            }
        }

        state.remaining = token_remaining;
        state.warning = WarningLevel::for_remaining(token_remaining);
        state.last_armed = Some(Instant::now());
        self.rearms.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(remaining = token_remaining, "Countdown re-armed after activity");
    }

    /// Explicit operator-initiated renewal, outside the poll schedule.
    pub async fn extend_session(self: &Arc<Self>) -> ExtendOutcome {
        if self.refresher.refresh().await {
            let token_remaining = match self.store.token().await {
                Some(token) => seconds_remaining(&token),
                None => 0,
            };
            let mut state = self.state.lock().await;
            state.remaining = token_remaining;
            state.warning = WarningLevel::for_remaining(token_remaining);
            state.last_armed = Some(Instant::now());
            tracing::info!(remaining = token_remaining, "Session extended by operator");
            return ExtendOutcome::Extended;
        }

        let remaining = self.state.lock().await.remaining;
        if remaining > 0 {
            tracing::warn!(remaining, "Session extension failed, time still remains");
            return ExtendOutcome::StillCritical;
        }

        tracing::warn!("Session extension failed with no time left, forcing logout");
        {
            let mut state = self.state.lock().await;
            state.running = false;
            state.warning = WarningLevel::Expired;
        }
        let mut tasks = self.tasks.lock().await;
        tasks.cancel_all();
        drop(tasks);
        self.notify_expired();
        ExtendOutcome::Expired
    }

    /// Cancel every scheduled task and stop the countdown.
    ///
    /// Idempotent; safe to call when nothing is armed. The final clock
    /// reading is preserved until the next arm so the shell can render an
    /// expiry notice after a forced logout.
    pub async fn teardown(&self) {
        let mut tasks = self.tasks.lock().await;
        tasks.cancel_all();
        drop(tasks);

        let mut state = self.state.lock().await;
        state.running = false;
        state.last_armed = None;
        tracing::debug!("Expiry monitor torn down");
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    /// Whether any scheduled task handle is still held.
    pub async fn has_scheduled_tasks(&self) -> bool {
        let tasks = self.tasks.lock().await;
        tasks.tick.is_some() || tasks.poll.is_some() || tasks.debounce.is_some()
    }

    /// Snapshot for the shell's session indicator.
    pub async fn clock(&self) -> SessionClock {
        let state = self.state.lock().await;
        SessionClock {
            remaining_seconds: state.remaining,
            warning_level: state.warning,
            seconds_since_activity: state.last_activity.elapsed().as_secs(),
        }
    }

    #[cfg(test)]
    pub(crate) fn rearm_count(&self) -> u64 {
        self.rearms.load(Ordering::SeqCst)
    }
}
