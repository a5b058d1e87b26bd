//! C2 (workflow half) — the CI/CD transcript parser contract. Structurally
//! identical to `ToolParser` but returns fully hierarchical events: the
//! unified `ValidationEvent` already carries every `WorkflowEvent` field
//! (scope/group/unit, `workflow_type`, `hierarchy_level`, `parent_id`), so
//! there is no separate wrapper type (see SPEC_FULL.md §3 supplement).

use crate::common::map_level_to_severity;
use crate::model::ValidationEvent;
use crate::registry::ToolParserRegistry;

pub trait WorkflowParser: Send + Sync {
    fn can_parse(&self, content: &str) -> bool;

    /// Full hierarchical parse. `registry` is the tool-parser registry,
    /// passed in so delegating parsers (Jenkins, Spack) can re-enter it
    /// for a step whose command matches a registered tool.
    fn parse_workflow_log(&self, content: &str, registry: &ToolParserRegistry) -> Vec<ValidationEvent>;

    fn format_name(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn priority(&self) -> i32;
}

/// Builds the common skeleton of a workflow-hierarchy event: tool name,
/// workflow type, and hierarchy fields, leaving message/severity/status to
/// the caller. Grounds spec.md §4.2's `create_base_event` helper.
pub fn create_base_event(
    tool_name: &str,
    event_type: crate::model::ValidationEventType,
    workflow_type: &str,
    hierarchy_level: i32,
) -> ValidationEvent {
    let mut e = ValidationEvent::new(tool_name, event_type);
    e.workflow_type = workflow_type.to_string();
    e.hierarchy_level = hierarchy_level;
    e
}

/// Normalizes a handful of timestamp shapes commonly seen in CI
/// transcripts, preserving the original string (spec.md §3: `started_at`
/// "format preserved from source") — this only validates/extracts, it
/// never reformats.
pub fn extract_timestamp(line: &str) -> String {
    static PATTERNS: once_cell::sync::Lazy<Vec<regex::Regex>> = once_cell::sync::Lazy::new(|| {
        vec![
            regex::Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z?").unwrap(),
            regex::Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").unwrap(),
        ]
    });
    for re in PATTERNS.iter() {
        if let Some(m) = re.find(line) {
            return m.as_str().to_string();
        }
    }
    String::new()
}

/// Maps a freeform status/message pair to a severity, per spec.md §4.2's
/// `determine_severity` helper: delegates to the shared level table, but
/// also checks the message body when the line has no explicit level.
pub fn determine_severity(status_hint: &str, message: &str) -> (crate::model::ValidationEventStatus, &'static str) {
    let (status, sev) = map_level_to_severity(status_hint);
    if status == crate::model::ValidationEventStatus::Info && status_hint.is_empty() {
        return map_level_to_severity(message);
    }
    (status, sev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_timestamp_finds_iso8601() {
        let line = "2024-01-15T10:30:00.123Z ##[group]Run tests";
        assert_eq!(extract_timestamp(line), "2024-01-15T10:30:00.123Z");
    }

    #[test]
    fn determine_severity_falls_back_to_message() {
        let (status, sev) = determine_severity("", "fatal error occurred");
        assert_eq!(status, crate::model::ValidationEventStatus::Error);
        assert_eq!(sev, "critical");
    }
}
