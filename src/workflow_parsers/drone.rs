//! Hierarchical Drone CI transcript parser. A Drone build log is one flat
//! stream of `+ command` / output / `exit code N` triples across the
//! pipeline's steps, with no nested grouping markers of its own — steps are
//! recovered purely from consecutive `+ command` lines. Every line in a
//! step's body becomes its own event (spec.md §4.5's per-line emission
//! policy for GitHub Actions/GitLab/Docker/Drone/Terraform); Drone never
//! delegates to the tool registry by content-sniffing — only Jenkins/Spack
//! do, by matching the echoed command itself.

use crate::common::map_level_to_severity;
use crate::model::{ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::registry::ToolParserRegistry;
use crate::workflow::{create_base_event, WorkflowParser};
use once_cell::sync::Lazy;
use regex::Regex;

static CMD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+ (?P<cmd>.*)$").unwrap());
static EXIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"exit code (?P<code>\d+)").unwrap());

pub struct DroneParser;

impl WorkflowParser for DroneParser {
    fn can_parse(&self, content: &str) -> bool {
        content.lines().any(|l| CMD_RE.is_match(l)) && content.contains("exit code")
    }

    fn parse_workflow_log(&self, content: &str, _registry: &ToolParserRegistry) -> Vec<ValidationEvent> {
        let job_id = "job-0".to_string();
        let lines: Vec<&str> = content.lines().collect();
        let mut events = Vec::new();
        let mut i = 0;
        let mut step_index = 0;
        while i < lines.len() {
            let Some(caps) = CMD_RE.captures(lines[i]) else {
                i += 1;
                continue;
            };
            let command = caps["cmd"].to_string();
            let step_id = format!("{job_id}-step-{step_index}");
            step_index += 1;

            // `body_end` is the index of the last line belonging to this
            // step (inclusive of a terminating `exit code N` line, since
            // that line is itself part of the step's output); `next_i` is
            // where the outer loop resumes, which excludes a following
            // `+ command` line from this step's body.
            let mut body_end = lines.len() - 1;
            let mut next_i = lines.len();
            let mut exit_code = 0;
            for (offset, later) in lines.iter().enumerate().skip(i + 1) {
                if let Some(c) = EXIT_RE.captures(later) {
                    exit_code = c["code"].parse().unwrap_or(0);
                    body_end = offset;
                    next_i = offset + 1;
                    break;
                }
                if CMD_RE.is_match(later) {
                    body_end = offset.saturating_sub(1);
                    next_i = offset;
                    break;
                }
            }
            let body: &[&str] = if i + 1 > body_end { &[] } else { &lines[i + 1..=body_end] };

            let mut worst = (ValidationEventStatus::Pass, "info");
            for line in body {
                let (status, sev) = map_level_to_severity(line);
                if status == ValidationEventStatus::Error {
                    worst = (status, sev);
                } else if status == ValidationEventStatus::Warning && worst.0 != ValidationEventStatus::Error {
                    worst = (status, sev);
                }
            }
            if exit_code != 0 {
                worst = (ValidationEventStatus::Error, "error");
            }

            let mut step_event = create_base_event("drone", ValidationEventType::Summary, "drone", 2);
            step_event.scope = "pipeline".to_string();
            step_event.group = "job".to_string();
            step_event.group_id = job_id.clone();
            step_event.unit = command.clone();
            step_event.unit_id = step_id.clone();
            step_event.parent_id = job_id.clone();
            step_event.message = format!("command: {command}");
            step_event.set_outcome(worst.0, worst.1);
            events.push(step_event);

            for line in body {
                if line.trim().is_empty() {
                    continue;
                }
                let (status, sev) = map_level_to_severity(line);
                let event_type = if status == ValidationEventStatus::Error {
                    ValidationEventType::BuildError
                } else {
                    ValidationEventType::DebugInfo
                };
                let mut e = create_base_event("drone", event_type, "drone", 3);
                e.scope = "pipeline".to_string();
                e.group = "job".to_string();
                e.group_id = job_id.clone();
                e.unit = command.clone();
                e.unit_id = step_id.clone();
                e.parent_id = step_id.clone();
                e.log_content = line.to_string();
                e.message = line.to_string();
                e.set_outcome(status, sev);
                events.push(e);
            }

            i = next_i;
        }
        events
    }

    fn format_name(&self) -> &'static str {
        "drone"
    }

    fn name(&self) -> &'static str {
        "drone"
    }

    fn priority(&self) -> i32 {
        120
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registries;

    #[test]
    fn nonzero_exit_marks_step_error_and_emits_line_events() {
        let regs = Registries::bootstrap();
        let content = "+ npm test\nsome output\nexit code 1\n";
        let parser = DroneParser;
        assert!(parser.can_parse(content));
        let events = parser.parse_workflow_log(content, &regs.tools);
        let step = events.iter().find(|e| e.hierarchy_level == 2).unwrap();
        assert_eq!(step.status, ValidationEventStatus::Error);
        let line_events: Vec<_> = events.iter().filter(|e| e.hierarchy_level == 3).collect();
        assert_eq!(line_events.len(), 2);
        assert_eq!(line_events[0].log_content, "some output");
        assert_eq!(line_events[1].log_content, "exit code 1");
    }

    #[test]
    fn excludes_next_steps_command_line_from_prior_steps_body() {
        let regs = Registries::bootstrap();
        let content = "+ echo one\nfirst output\n+ echo two\nsecond output\nexit code 0\n";
        let parser = DroneParser;
        let events = parser.parse_workflow_log(content, &regs.tools);
        let first_step_lines: Vec<_> = events
            .iter()
            .filter(|e| e.hierarchy_level == 3 && e.unit == "echo one")
            .collect();
        assert_eq!(first_step_lines.len(), 1);
        assert_eq!(first_step_lines[0].log_content, "first output");
    }
}
