//! C7 — post-parse severity filtering and event-id renumbering. Runs
//! after a parser (tool or workflow) has produced its full event vector;
//! enrichment itself (workflow delegation) happens during parsing, not
//! here (spec.md §4.7).

use crate::model::{severity_passes_threshold, SeverityLevel, ValidationEvent};

/// Drops events below `threshold`, preserving relative order, then
/// renumbers `event_id` to close the gaps left by dropped events.
pub fn filter_and_renumber(events: Vec<ValidationEvent>, threshold: SeverityLevel) -> Vec<ValidationEvent> {
    let mut kept: Vec<ValidationEvent> = events
        .into_iter()
        .filter(|e| severity_passes_threshold(&e.severity, threshold))
        .collect();
    for (i, event) in kept.iter_mut().enumerate() {
        event.event_id = (i + 1) as i64;
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ValidationEventStatus, ValidationEventType};

    fn mk(id: i64, severity: &str) -> ValidationEvent {
        let mut e = ValidationEvent::new("x", ValidationEventType::DebugEvent);
        e.event_id = id;
        e.severity = severity.to_string();
        e.status = ValidationEventStatus::Info;
        e
    }

    #[test]
    fn filters_and_renumbers_preserving_order() {
        let events = vec![mk(1, "debug"), mk(2, "warning"), mk(3, "info"), mk(4, "error")];
        let kept = filter_and_renumber(events, SeverityLevel::Warning);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].event_id, 1);
        assert_eq!(kept[0].severity, "warning");
        assert_eq!(kept[1].event_id, 2);
        assert_eq!(kept[1].severity, "error");
    }
}
