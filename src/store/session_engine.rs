//! Session engine.
//!
//! Turns a stream of key events into a continuously updated WPM figure.
//! The engine is a plain synchronous state machine: it never blocks, never
//! spawns, and holds no locks. Whoever owns it must serialize every call
//! (see [`crate::tracker`]).
//!
//! The inactivity timer is modelled as `SessionState::inactivity_deadline`.
//! Arming, re-arming and cancelling the timer are plain writes to that
//! field, and [`SessionEngine::handle_inactivity_timeout`] only acts when
//! the deadline is still armed and has passed. A cancelled timer therefore
//! has no way to end a session.

use super::aggregator::{compute_wpm, elapsed_between, format_wpm};
use super::clock::{Clock, SystemClock};
use super::types::{
    AggregateHistory, EndReason, SessionState, SessionStatus, SessionSummary, TrackerSnapshot,
};
use crate::monitor::key_filter::{is_countable, KeyCode, KeyEvent, ModifierFlags};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Quiet period after which an active session ends on its own.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(15);

/// Owns the session state, the keystroke counter, the inactivity deadline
/// and the aggregate history.
#[derive(Debug)]
pub struct SessionEngine<C: Clock = SystemClock> {
    clock: C,
    inactivity_timeout: Duration,
    state: SessionState,
    history: AggregateHistory,
    wpm: f64,
    formatted_wpm: String,
}

impl SessionEngine<SystemClock> {
    /// Creates an idle engine on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock, DEFAULT_INACTIVITY_TIMEOUT)
    }
}

impl Default for SessionEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SessionEngine<C> {
    pub fn with_clock(clock: C, inactivity_timeout: Duration) -> Self {
        Self {
            clock,
            inactivity_timeout,
            state: SessionState::default(),
            history: AggregateHistory::new(),
            wpm: 0.0,
            formatted_wpm: format_wpm(0.0),
        }
    }

    // === Session Control ===

    /// Starts a fresh session, discarding any counters in progress.
    pub fn start_session(&mut self) {
        self.state.clear();
        self.state.status = SessionStatus::Active;
        self.set_wpm(0.0);
        tracing::info!("Session started");
    }

    /// Throws the current session away without archiving it.
    pub fn reset_session(&mut self) {
        self.state.clear();
        self.state.status = SessionStatus::Idle;
        self.set_wpm(0.0);
        tracing::info!("Session reset");
    }

    /// Ends the current session, folding it into the aggregate history if
    /// any keystroke was seen. The last WPM stays on display.
    pub fn end_session(&mut self) -> Option<SessionSummary> {
        self.end_session_with(EndReason::Manual)
    }

    /// [`end_session`](Self::end_session) tagged with why the session ended.
    pub fn end_session_with(&mut self, reason: EndReason) -> Option<SessionSummary> {
        self.state.inactivity_deadline = None;
        self.state.status = SessionStatus::Ending;

        let summary = self.state.session_start_time.map(|started_at| {
            let ended_at = self.clock.now();
            let elapsed = elapsed_between(started_at, ended_at);
            let keystrokes = self.state.keystroke_count;
            self.history.record(keystrokes, elapsed);

            let wpm = compute_wpm(keystrokes, elapsed);
            SessionSummary {
                keystrokes,
                elapsed,
                wpm,
                formatted_wpm: format_wpm(wpm),
                started_at,
                ended_at,
                reason,
            }
        });

        self.state.clear();
        self.state.status = SessionStatus::Idle;

        match &summary {
            Some(summary) => tracing::info!(
                keystrokes = summary.keystrokes,
                elapsed_secs = summary.elapsed_secs(),
                wpm = %summary.formatted_wpm,
                ?reason,
                "Session ended"
            ),
            None => tracing::info!(?reason, "Session ended without keystrokes"),
        }

        summary
    }

    // === Event Handling ===

    /// Processes one raw key-down event.
    ///
    /// Returns `true` if the keystroke was counted. A no-op while no
    /// session is active.
    pub fn handle_keystroke(&mut self, key_code: KeyCode, modifier_flags: ModifierFlags) -> bool {
        if !self.state.is_active() {
            tracing::trace!("Key event ignored - session not started");
            return false;
        }

        let now = self.clock.now();

        // Cancel and re-arm in one step.
        self.state.inactivity_deadline = Some(now + self.timeout_delta());

        if self.state.session_start_time.is_none() {
            self.state.session_start_time = Some(now);
        }

        let counted = is_countable(key_code, modifier_flags);
        if counted {
            self.state.keystroke_count += 1;
            tracing::trace!(count = self.state.keystroke_count, "Keystroke counted");
        }

        self.update_wpm(now);
        counted
    }

    pub fn handle_key_event(&mut self, event: KeyEvent) -> bool {
        self.handle_keystroke(event.key_code, event.modifier_flags)
    }

    /// Ends the session if its inactivity deadline is armed and has passed.
    ///
    /// Early or stale wake-ups are ignored.
    pub fn handle_inactivity_timeout(&mut self) -> Option<SessionSummary> {
        if !self.state.is_active() {
            return None;
        }

        let deadline = self.state.inactivity_deadline?;
        if self.clock.now() < deadline {
            tracing::trace!("Inactivity wake-up before deadline, ignoring");
            return None;
        }

        tracing::debug!("Inactivity window elapsed");
        self.end_session_with(EndReason::Inactivity)
    }

    fn update_wpm(&mut self, now: DateTime<Utc>) {
        let Some(start) = self.state.session_start_time else {
            return;
        };
        let elapsed = elapsed_between(start, now);
        self.set_wpm(compute_wpm(self.state.keystroke_count, elapsed));
    }

    fn set_wpm(&mut self, wpm: f64) {
        self.wpm = wpm;
        self.formatted_wpm = format_wpm(wpm);
    }

    fn timeout_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.inactivity_timeout)
            .unwrap_or_else(|_| chrono::Duration::seconds(15))
    }

    // === Accessors ===

    /// Last computed WPM.
    pub fn current_wpm(&self) -> f64 {
        self.wpm
    }

    /// Last computed WPM with two fraction digits.
    pub fn formatted_wpm(&self) -> &str {
        &self.formatted_wpm
    }

    pub fn is_session_started(&self) -> bool {
        self.state.is_active()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn keystroke_count(&self) -> u64 {
        self.state.keystroke_count
    }

    pub fn session_start_time(&self) -> Option<DateTime<Utc>> {
        self.state.session_start_time
    }

    /// When the session will end on its own, if a keystroke armed the timer.
    pub fn inactivity_deadline(&self) -> Option<DateTime<Utc>> {
        self.state.inactivity_deadline
    }

    pub fn inactivity_timeout(&self) -> Duration {
        self.inactivity_timeout
    }

    pub fn history(&self) -> &AggregateHistory {
        &self.history
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn snapshot(&self, capture_authorized: bool) -> TrackerSnapshot {
        TrackerSnapshot {
            formatted_wpm: self.formatted_wpm.clone(),
            is_session_started: self.is_session_started(),
            capture_authorized,
            session_keystrokes: self.state.keystroke_count,
            history: self.history.clone(),
        }
    }
}
