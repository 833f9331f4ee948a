//! Deterministic trigger rules.
//!
//! Pure functions over an injected clock, feed, or state snapshot; the
//! orchestrator's tick supplies the live values. The AI-gated rule
//! lives in the orchestrator because it needs the gateway.

use crate::network::{Metric, NetworkState};
use crate::persist::NetworkEvent;
use chrono::{DateTime, Local, Utc};

/// A time trigger fires when the local wall clock reads the target
/// "HH:MM".
pub fn time_matches(at: &str, now: &DateTime<Local>) -> bool {
    now.format("%H:%M").to_string() == at
}

/// An event trigger fires when the feed holds a matching event newer
/// than the trigger's previous check. With no previous check, any
/// matching event fires.
pub fn event_matches(
    event_type: &str,
    last_checked: Option<DateTime<Utc>>,
    feed: &[NetworkEvent],
) -> bool {
    feed.iter().any(|event| {
        event.event_type == event_type
            && last_checked.map_or(true, |checked| event.timestamp > checked)
    })
}

/// A condition trigger fires when the named metric meets its threshold.
pub fn metric_matches(metric: Metric, threshold: i64, state: &NetworkState) -> bool {
    let observed = match metric {
        Metric::OperativeCount => state.operatives.len() as i64,
        Metric::QuestCompletions => state
            .quests
            .iter()
            .filter(|q| q.status == crate::network::QuestStatus::Completed)
            .count() as i64,
    };
    observed >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn event(event_type: &str, timestamp: DateTime<Utc>) -> NetworkEvent {
        NetworkEvent {
            event_type: event_type.to_string(),
            timestamp,
            payload: json!({}),
        }
    }

    #[test]
    fn test_time_matches_exact_minute() {
        let now = Local.with_ymd_and_hms(2025, 3, 1, 9, 30, 45).unwrap();
        assert!(time_matches("09:30", &now));
        assert!(!time_matches("09:31", &now));
    }

    #[test]
    fn test_event_matches_only_newer() {
        let checked = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let older = event("intrusion", checked - chrono::Duration::minutes(5));
        let newer = event("intrusion", checked + chrono::Duration::minutes(5));

        assert!(!event_matches("intrusion", Some(checked), &[older.clone()]));
        assert!(event_matches("intrusion", Some(checked), &[older, newer]));
    }

    #[test]
    fn test_event_matches_without_previous_check() {
        let feed = [event("intrusion", Utc::now())];
        assert!(event_matches("intrusion", None, &feed));
        assert!(!event_matches("other", None, &feed));
    }

    #[test]
    fn test_metric_matches_operative_count() {
        let mut state = NetworkState::new();
        state.recruit("a", vec![]);
        state.recruit("b", vec![]);

        assert!(metric_matches(Metric::OperativeCount, 2, &state));
        assert!(!metric_matches(Metric::OperativeCount, 3, &state));
    }
}
