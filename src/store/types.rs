//! Data types for session tracking.
//!
//! Defines per-session state, the process-lifetime aggregate and the
//! read-only views handed to the presentation layer.

use super::aggregator::{compute_wpm, format_wpm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of a measurement session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
    /// Transient while a session is being archived. Never observable
    /// outside the engine.
    Ending,
}

/// Per-session counters. Owned exclusively by the session engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: SessionStatus,

    /// Set by the first keystroke after the session started.
    pub session_start_time: Option<DateTime<Utc>>,

    /// Countable keystrokes since the session started.
    pub keystroke_count: u64,

    /// When the session ends on its own unless another keystroke arrives.
    pub inactivity_deadline: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Drops every per-session counter and the pending deadline.
    pub fn clear(&mut self) {
        self.session_start_time = None;
        self.keystroke_count = 0;
        self.inactivity_deadline = None;
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Running totals across all completed sessions of this process.
///
/// Only updated when a session ends; a reset session never lands here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateHistory {
    pub total_keystrokes: u64,
    pub total_elapsed: Duration,
    pub sessions_completed: u32,
}

impl AggregateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one completed session into the totals.
    pub fn record(&mut self, keystrokes: u64, elapsed: Duration) {
        self.total_keystrokes += keystrokes;
        self.total_elapsed += elapsed;
        self.sessions_completed += 1;
    }

    /// Lifetime WPM over all archived sessions.
    pub fn average_wpm(&self) -> f64 {
        compute_wpm(self.total_keystrokes, self.total_elapsed)
    }

    pub fn formatted_average_wpm(&self) -> String {
        format_wpm(self.average_wpm())
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Manual,
    Inactivity,
    Shutdown,
}

/// What a session contributed to the aggregate history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub keystrokes: u64,
    pub elapsed: Duration,
    pub wpm: f64,
    pub formatted_wpm: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub reason: EndReason,
}

impl SessionSummary {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Fixed two-decimal WPM, ready for a menu-bar label.
    pub formatted_wpm: String,
    pub is_session_started: bool,
    pub capture_authorized: bool,
    pub session_keystrokes: u64,
    pub history: AggregateHistory,
}

impl Default for TrackerSnapshot {
    fn default() -> Self {
        Self {
            formatted_wpm: format_wpm(0.0),
            is_session_started: false,
            capture_authorized: false,
            session_keystrokes: 0,
            history: AggregateHistory::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_clear() {
        let mut state = SessionState {
            status: SessionStatus::Active,
            session_start_time: Some(Utc::now()),
            keystroke_count: 42,
            inactivity_deadline: Some(Utc::now()),
        };

        state.clear();

        assert!(state.is_active());
        assert!(state.session_start_time.is_none());
        assert_eq!(state.keystroke_count, 0);
        assert!(state.inactivity_deadline.is_none());
    }

    #[test]
    fn test_aggregate_history_record() {
        let mut history = AggregateHistory::new();
        history.record(100, Duration::from_secs(60));
        history.record(50, Duration::from_secs(30));

        assert_eq!(history.total_keystrokes, 150);
        assert_eq!(history.total_elapsed, Duration::from_secs(90));
        assert_eq!(history.sessions_completed, 2);
        // 30 words over 1.5 minutes, normalized by 10.
        assert_eq!(history.formatted_average_wpm(), "2.00");
    }

    #[test]
    fn test_empty_history_average_is_zero() {
        assert_eq!(AggregateHistory::new().formatted_average_wpm(), "0.00");
    }

    #[test]
    fn test_snapshot_default() {
        let snapshot = TrackerSnapshot::default();
        assert_eq!(snapshot.formatted_wpm, "0.00");
        assert!(!snapshot.is_session_started);
        assert!(!snapshot.capture_authorized);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = SessionSummary {
            keystrokes: 50,
            elapsed: Duration::from_secs(60),
            wpm: 1.0,
            formatted_wpm: "1.00".to_string(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            reason: EndReason::Inactivity,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"reason\":\"inactivity\""));
        assert!(json.contains("\"formatted_wpm\":\"1.00\""));
    }
}
