//! Hierarchical GitLab CI transcript parser. `section_start:TIME:NAME` /
//! `section_end:TIME:NAME` markers delimit one job's sections the way
//! GitHub Actions' `##[group]`/`##[endgroup]` delimit steps; this parser
//! mirrors `github_actions.rs`'s section-splitting shape over GitLab's own
//! marker syntax, including its one-event-per-line policy (spec.md §4.5) —
//! GitLab CI never delegates to the tool registry by content-sniffing.

use crate::common::map_level_to_severity;
use crate::model::{ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::registry::ToolParserRegistry;
use crate::workflow::{create_base_event, WorkflowParser};
use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^section_start:\d+:(?P<name>\S+)").unwrap());
static SECTION_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^section_end:\d+:(?P<name>\S+)").unwrap());
static ERROR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<level>ERROR|WARNING): (?P<msg>.*)$").unwrap());

pub struct GitlabCiParser;

impl WorkflowParser for GitlabCiParser {
    fn can_parse(&self, content: &str) -> bool {
        content.contains("section_start:") || content.contains("Running with gitlab-runner")
    }

    fn parse_workflow_log(&self, content: &str, _registry: &ToolParserRegistry) -> Vec<ValidationEvent> {
        let job_id = "job-0".to_string();
        let mut events = Vec::new();
        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;
        let mut section_index = 0;
        while i < lines.len() {
            let Some(caps) = SECTION_START_RE.captures(lines[i]) else {
                i += 1;
                continue;
            };
            let section_name = caps["name"].replace(['_', '-'], " ");
            let section_id = format!("{job_id}-section-{section_index}");
            section_index += 1;
            let start = i;
            let mut end = lines.len();
            for (offset, later) in lines.iter().enumerate().skip(i + 1) {
                if SECTION_END_RE.is_match(later) {
                    end = offset;
                    break;
                }
            }
            let body = &lines[start + 1..end.min(lines.len())];

            let mut worst = (ValidationEventStatus::Pass, "info");
            for line in body {
                let (status, sev) = line_severity(line);
                if status == ValidationEventStatus::Error {
                    worst = (status, sev);
                } else if status == ValidationEventStatus::Warning && worst.0 != ValidationEventStatus::Error {
                    worst = (status, sev);
                }
            }
            let mut section_event = create_base_event("gitlab_ci", ValidationEventType::Summary, "gitlab_ci", 2);
            section_event.scope = "pipeline".to_string();
            section_event.group = "job".to_string();
            section_event.group_id = job_id.clone();
            section_event.unit = section_name.clone();
            section_event.unit_id = section_id.clone();
            section_event.parent_id = job_id.clone();
            section_event.message = format!("section: {section_name}");
            section_event.set_outcome(worst.0, worst.1);
            events.push(section_event);

            for line in body {
                if line.trim().is_empty() {
                    continue;
                }
                let (status, sev) = line_severity(line);
                let event_type = if status == ValidationEventStatus::Error {
                    ValidationEventType::BuildError
                } else {
                    ValidationEventType::DebugInfo
                };
                let mut e = create_base_event("gitlab_ci", event_type, "gitlab_ci", 3);
                e.scope = "pipeline".to_string();
                e.group = "job".to_string();
                e.group_id = job_id.clone();
                e.unit = section_name.clone();
                e.unit_id = section_id.clone();
                e.parent_id = section_id.clone();
                e.log_content = line.to_string();
                e.message = match ERROR_RE.captures(line) {
                    Some(caps) => caps["msg"].to_string(),
                    None => line.to_string(),
                };
                e.set_outcome(status, sev);
                events.push(e);
            }

            i = end + 1;
        }
        events
    }

    fn format_name(&self) -> &'static str {
        "gitlab_ci"
    }

    fn name(&self) -> &'static str {
        "gitlab_ci"
    }

    fn priority(&self) -> i32 {
        130
    }
}

/// Derives a line's severity, preferring the explicit `ERROR:`/`WARNING:`
/// prefix when present so its level token (rather than the free-text
/// message) drives the lookup.
fn line_severity(line: &str) -> (ValidationEventStatus, &'static str) {
    if let Some(caps) = ERROR_RE.captures(line) {
        return map_level_to_severity(&caps["level"]);
    }
    map_level_to_severity(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registries;

    #[test]
    fn splits_sections_and_captures_errors() {
        let regs = Registries::bootstrap();
        let content = "Running with gitlab-runner 16.0\nsection_start:1700000000:build_job\nbuilding...\nERROR: compilation failed\nsection_end:1700000001:build_job\n";
        let parser = GitlabCiParser;
        assert!(parser.can_parse(content));
        let events = parser.parse_workflow_log(content, &regs.tools);
        assert!(events.iter().any(|e| e.hierarchy_level == 2 && e.unit == "build job"));
        assert!(events.iter().any(|e| e.hierarchy_level == 3 && e.status == ValidationEventStatus::Error));
    }

    #[test]
    fn emits_one_event_per_line_in_a_section() {
        let regs = Registries::bootstrap();
        let content = "section_start:1700000000:test_job\nline one\nline two\nsection_end:1700000001:test_job\n";
        let events = GitlabCiParser.parse_workflow_log(content, &regs.tools);
        let line_events: Vec<_> = events.iter().filter(|e| e.hierarchy_level == 3).collect();
        assert_eq!(line_events.len(), 2);
    }
}
