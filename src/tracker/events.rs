//! Lifecycle events published by the tracker.

use crate::store::{EndReason, SessionSummary};
use serde::{Deserialize, Serialize};

/// Session lifecycle and capture notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackerEvent {
    SessionStarted,
    SessionReset,
    /// `summary` is `None` when the session ended before any keystroke.
    SessionEnded {
        reason: EndReason,
        summary: Option<SessionSummary>,
    },
    PermissionGranted,
}

impl TrackerEvent {
    /// Short machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerEvent::SessionStarted => "session_started",
            TrackerEvent::SessionReset => "session_reset",
            TrackerEvent::SessionEnded { .. } => "session_ended",
            TrackerEvent::PermissionGranted => "permission_granted",
        }
    }

    /// Serializes as `{"type": .., "data": .., "timestamp": ..}`.
    pub fn to_json(&self) -> String {
        let data = match self {
            TrackerEvent::SessionEnded { reason, summary } => serde_json::json!({
                "reason": reason,
                "summary": summary,
            }),
            _ => serde_json::Value::Null,
        };
        let message = serde_json::json!({
            "type": self.kind(),
            "data": data,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        serde_json::to_string(&message).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_event_kind() {
        assert_eq!(TrackerEvent::SessionStarted.kind(), "session_started");
        assert_eq!(TrackerEvent::PermissionGranted.kind(), "permission_granted");
    }

    #[test]
    fn test_session_ended_json() {
        let event = TrackerEvent::SessionEnded {
            reason: EndReason::Manual,
            summary: Some(SessionSummary {
                keystrokes: 75,
                elapsed: Duration::from_secs(30),
                wpm: 3.0,
                formatted_wpm: "3.00".to_string(),
                started_at: Utc::now(),
                ended_at: Utc::now(),
                reason: EndReason::Manual,
            }),
        };

        let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(json["type"], "session_ended");
        assert_eq!(json["data"]["reason"], "manual");
        assert_eq!(json["data"]["summary"]["keystrokes"], 75);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_simple_event_json_has_null_data() {
        let json: serde_json::Value =
            serde_json::from_str(&TrackerEvent::SessionReset.to_json()).unwrap();
        assert_eq!(json["type"], "session_reset");
        assert!(json["data"].is_null());
    }
}
