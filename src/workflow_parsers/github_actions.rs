//! Hierarchical GitHub Actions transcript parser. A single log file covers
//! one job; `##[group]Step name` / `##[endgroup]` pairs delimit steps
//! within it. Every line inside a step becomes its own event (spec.md
//! §4.5's "emit one event per meaningful line, keep all lines" policy for
//! GitHub Actions/GitLab/Docker/Drone/Terraform) — unlike Jenkins/Spack,
//! this parser never delegates to the tool registry by sniffing a step's
//! content.

use crate::common::map_level_to_severity;
use crate::model::{ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::registry::ToolParserRegistry;
use crate::workflow::{create_base_event, extract_timestamp, WorkflowParser};
use once_cell::sync::Lazy;
use regex::Regex;

static GROUP_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\S+ )?##\[group\](?P<name>.*)$").unwrap());
static GROUP_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\S+ )?##\[endgroup\]").unwrap());
static ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\S+ )?##\[(?P<level>error|warning|notice)\](?P<msg>.*)$").unwrap());

pub struct GithubActionsParser;

impl GithubActionsParser {
    /// Parses one job's transcript, tagging every event with the given job
    /// name/order so `github_actions_zip` can reuse this per archive entry.
    pub fn parse_job(
        &self,
        content: &str,
        job_name: &str,
        job_order: i32,
        _registry: &ToolParserRegistry,
    ) -> Vec<ValidationEvent> {
        let job_id = format!("job-{job_order}");
        let mut events = Vec::new();
        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;
        let mut step_index = 0;
        while i < lines.len() {
            let line = lines[i];
            if let Some(caps) = GROUP_START_RE.captures(line) {
                let step_name = caps["name"].trim().to_string();
                let step_id = format!("{job_id}-step-{step_index}");
                step_index += 1;
                let start = i;
                let mut end = lines.len();
                for (offset, later) in lines.iter().enumerate().skip(i + 1) {
                    if GROUP_END_RE.is_match(later) {
                        end = offset;
                        break;
                    }
                }
                let body = &lines[start + 1..end.min(lines.len())];
                self.emit_step_events(body, &step_name, &job_id, job_name, job_order, &step_id, &mut events);
                i = end + 1;
                continue;
            }
            if let Some(caps) = ANNOTATION_RE.captures(line) {
                let mut e = create_base_event("github_actions", ValidationEventType::BuildError, "github_actions", 1);
                e.scope = "workflow".to_string();
                e.group = job_name.to_string();
                e.group_id = job_id.clone();
                e.job_order = job_order;
                e.job_name = job_name.to_string();
                e.message = caps["msg"].trim().to_string();
                e.started_at = extract_timestamp(line);
                match &caps["level"] {
                    "error" => e.set_outcome(ValidationEventStatus::Error, "error"),
                    "warning" => e.set_outcome(ValidationEventStatus::Warning, "warning"),
                    _ => e.set_outcome(ValidationEventStatus::Info, "info"),
                }
                events.push(e);
            }
            i += 1;
        }
        events
    }

    fn emit_step_events(
        &self,
        body: &[&str],
        step_name: &str,
        job_id: &str,
        job_name: &str,
        job_order: i32,
        step_id: &str,
        events: &mut Vec<ValidationEvent>,
    ) {
        let mut worst = (ValidationEventStatus::Pass, "info");
        for line in body {
            let (status, sev) = line_severity(line);
            if status == ValidationEventStatus::Error {
                worst = (status, sev);
            } else if status == ValidationEventStatus::Warning && worst.0 != ValidationEventStatus::Error {
                worst = (status, sev);
            }
        }

        let mut step_event = create_base_event("github_actions", ValidationEventType::Summary, "github_actions", 2);
        step_event.scope = "workflow".to_string();
        step_event.group = job_name.to_string();
        step_event.group_id = job_id.to_string();
        step_event.unit = step_name.to_string();
        step_event.unit_id = step_id.to_string();
        step_event.parent_id = job_id.to_string();
        step_event.job_order = job_order;
        step_event.job_name = job_name.to_string();
        step_event.message = format!("step: {step_name}");
        step_event.set_outcome(worst.0, worst.1);
        events.push(step_event);

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
            let mut e = create_base_event("github_actions", event_type, "github_actions", 3);
            e.scope = "workflow".to_string();
            e.group = job_name.to_string();
            e.group_id = job_id.to_string();
            e.unit = step_name.to_string();
            e.unit_id = step_id.to_string();
            e.parent_id = step_id.to_string();
            e.job_order = job_order;
            e.job_name = job_name.to_string();
            e.log_content = line.to_string();
            e.message = match ANNOTATION_RE.captures(line) {
                Some(caps) => caps["msg"].trim().to_string(),
                None => line.to_string(),
            };
            e.started_at = extract_timestamp(line);
            e.set_outcome(status, sev);
            events.push(e);
        }
    }
}

/// Derives a line's severity, checking the `##[error]`/`##[warning]`
/// annotation syntax first (whose keywords also satisfy the shared level
/// table) then falling back to the raw line content.
fn line_severity(line: &str) -> (ValidationEventStatus, &'static str) {
    if let Some(caps) = ANNOTATION_RE.captures(line) {
        return map_level_to_severity(&caps["level"]);
    }
    map_level_to_severity(line)
}

impl WorkflowParser for GithubActionsParser {
    fn can_parse(&self, content: &str) -> bool {
        content.contains("##[group]") || content.contains("##[endgroup]")
    }

    fn parse_workflow_log(&self, content: &str, registry: &ToolParserRegistry) -> Vec<ValidationEvent> {
        self.parse_job(content, "job", 0, registry)
    }

    fn format_name(&self) -> &'static str {
        "github_actions"
    }

    fn name(&self) -> &'static str {
        "github_actions"
    }

    fn priority(&self) -> i32 {
        130
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registries;

    #[test]
    fn parses_step_and_annotation_hierarchy() {
        let regs = Registries::bootstrap();
        let content = "##[group]Run eslint\nnpm run lint\n##[error]build failed\n##[endgroup]\n##[error]top level failure\n";
        let parser = GithubActionsParser;
        assert!(parser.can_parse(content));
        let events = parser.parse_workflow_log(content, &regs.tools);
        assert!(events.iter().any(|e| e.hierarchy_level == 2 && e.unit == "Run eslint"));
        assert!(events.iter().any(|e| e.hierarchy_level == 1 && e.status == ValidationEventStatus::Error));
        let step_lines: Vec<_> = events.iter().filter(|e| e.hierarchy_level == 3).collect();
        assert_eq!(step_lines.len(), 2);
        assert!(step_lines.iter().any(|e| e.status == ValidationEventStatus::Error));
    }

    #[test]
    fn emits_one_event_per_line_within_a_step() {
        let regs = Registries::bootstrap();
        let content = "##[group]Build\nline one\nline two\nline three\n##[endgroup]\n";
        let events = GithubActionsParser.parse_workflow_log(content, &regs.tools);
        let step_lines: Vec<_> = events.iter().filter(|e| e.hierarchy_level == 3).collect();
        assert_eq!(step_lines.len(), 3);
        assert_eq!(step_lines[0].log_content, "line one");
        assert_eq!(step_lines[2].log_content, "line three");
    }
}
