//! Hierarchical Jenkins console-output parser. Declarative/scripted
//! pipelines bracket stages with `[Pipeline] { (Name)` / `[Pipeline] }` and
//! each `sh` step echoes its command as `+ command` before the command's
//! own output; this is the transcript shape spec.md §4.5 names command
//! extraction against, so unlike `github_actions.rs`/`gitlab_ci.rs`/
//! `drone.rs` (which never delegate — they emit one event per line), this
//! parser resolves a tool parser by matching the echoed command against
//! registered `CommandPattern`s.

use crate::common::map_level_to_severity;
use crate::model::{ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::registry::ToolParserRegistry;
use crate::workflow::{create_base_event, WorkflowParser};
use once_cell::sync::Lazy;
use regex::Regex;

static STAGE_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Pipeline\] \{ \((?P<name>[^)]+)\)").unwrap());
static STAGE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Pipeline\] \}").unwrap());
static COMMAND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+ (?P<cmd>.*)$").unwrap());
static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(?P<level>ERROR|WARNING)\]\s*(?P<msg>.*)$").unwrap());

pub struct JenkinsParser;

impl JenkinsParser {
    fn parse_stage(
        &self,
        body: &str,
        stage_name: &str,
        job_id: &str,
        stage_id: &str,
        registry: &ToolParserRegistry,
        events: &mut Vec<ValidationEvent>,
    ) {
        let lines: Vec<&str> = body.lines().collect();
        let mut i = 0;
        let mut step_index = 0;
        let mut stage_status = (ValidationEventStatus::Pass, "info");

        while i < lines.len() {
            if let Some(caps) = BRACKET_RE.captures(lines[i]) {
                let (status, sev) = map_level_to_severity(&caps["level"]);
                if status == ValidationEventStatus::Error {
                    stage_status = (status, sev);
                }
                let mut e = create_base_event("jenkins", ValidationEventType::BuildError, "jenkins", 3);
                e.scope = "pipeline".to_string();
                e.group = "main-build".to_string();
                e.group_id = job_id.to_string();
                e.unit = stage_name.to_string();
                e.unit_id = stage_id.to_string();
                e.parent_id = stage_id.to_string();
                e.message = caps["msg"].to_string();
                e.set_outcome(status, sev);
                events.push(e);
                i += 1;
                continue;
            }

            let Some(caps) = COMMAND_RE.captures(lines[i]) else {
                i += 1;
                continue;
            };
            let command = caps["cmd"].to_string();
            let step_id = format!("{stage_id}-step-{step_index}");
            step_index += 1;
            let mut end = lines.len();
            for (offset, later) in lines.iter().enumerate().skip(i + 1) {
                if COMMAND_RE.is_match(later) || STAGE_END_RE.is_match(later) {
                    end = offset;
                    break;
                }
            }
            let output = lines[i + 1..end].join("\n");

            if let Some(parser) = registry.find_parser_by_command(&command) {
                let mut step_event = create_base_event("jenkins", ValidationEventType::DebugInfo, "jenkins", 3);
                step_event.scope = "pipeline".to_string();
                step_event.group = "main-build".to_string();
                step_event.group_id = job_id.to_string();
                step_event.unit = stage_name.to_string();
                step_event.unit_id = step_id.clone();
                step_event.parent_id = stage_id.to_string();
                step_event.message = format!("command: {command}");
                step_event.set_outcome(ValidationEventStatus::Pass, "");
                events.push(step_event);

                for mut delegated in parser.parse(&output) {
                    if delegated.status == ValidationEventStatus::Error {
                        stage_status = (ValidationEventStatus::Error, "error");
                    }
                    delegated.scope = "pipeline".to_string();
                    delegated.group = "main-build".to_string();
                    delegated.group_id = job_id.to_string();
                    delegated.unit = stage_name.to_string();
                    delegated.unit_id = stage_id.to_string();
                    delegated.subunit = parser.name().to_string();
                    delegated.parent_id = step_id.clone();
                    delegated.workflow_type = "jenkins".to_string();
                    delegated.hierarchy_level = 4;
                    delegated.structured_data = parser.name().to_string();
                    events.push(delegated);
                }
            }
            i = end;
        }

        let mut stage_event = create_base_event("jenkins", ValidationEventType::Summary, "jenkins", 2);
        stage_event.scope = "pipeline".to_string();
        stage_event.group = "main-build".to_string();
        stage_event.group_id = job_id.to_string();
        stage_event.unit = stage_name.to_string();
        stage_event.unit_id = stage_id.to_string();
        stage_event.parent_id = job_id.to_string();
        stage_event.message = format!("stage: {stage_name}");
        stage_event.set_outcome(stage_status.0, stage_status.1);
        events.insert(0, stage_event);
    }
}

impl WorkflowParser for JenkinsParser {
    fn can_parse(&self, content: &str) -> bool {
        content.contains("Started by")
            || content.contains("Finished: SUCCESS")
            || content.contains("Finished: FAILURE")
    }

    fn parse_workflow_log(&self, content: &str, registry: &ToolParserRegistry) -> Vec<ValidationEvent> {
        let job_id = "job-0".to_string();
        let mut events = Vec::new();
        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;
        let mut stage_index = 0;
        while i < lines.len() {
            let Some(caps) = STAGE_START_RE.captures(lines[i]) else {
                i += 1;
                continue;
            };
            let stage_name = caps["name"].to_string();
            let stage_id = format!("{job_id}-stage-{stage_index}");
            stage_index += 1;
            let start = i;
            let mut end = lines.len();
            for (offset, later) in lines.iter().enumerate().skip(i + 1) {
                if STAGE_END_RE.is_match(later) {
                    end = offset;
                    break;
                }
            }
            let body = lines[start + 1..end.min(lines.len())].join("\n");
            self.parse_stage(&body, &stage_name, &job_id, &stage_id, registry, &mut events);
            i = end + 1;
        }

        let mut summary = create_base_event("jenkins", ValidationEventType::Summary, "jenkins", 1);
        summary.scope = "pipeline".to_string();
        summary.group = "main-build".to_string();
        summary.group_id = job_id.clone();
        summary.parent_id = String::new();
        if content.contains("Finished: FAILURE") {
            summary.message = "build finished: FAILURE".to_string();
            summary.set_outcome(ValidationEventStatus::Error, "error");
        } else {
            summary.message = "build finished: SUCCESS".to_string();
            summary.set_outcome(ValidationEventStatus::Pass, "");
        }
        events.push(summary);

        events
    }

    fn format_name(&self) -> &'static str {
        "jenkins"
    }

    fn name(&self) -> &'static str {
        "jenkins"
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
    fn delegates_by_echoed_command_spec_scenario_s4() {
        let regs = Registries::bootstrap();
        let content = concat!(
            "Started by user admin\n",
            "[Pipeline] { (Lint)\n",
            "+ eslint --format=json src/\n",
            "[{\"filePath\":\"/a.js\",\"messages\":[{\"ruleId\":\"r\",\"severity\":2,\"message\":\"m\",\"line\":1,\"column\":1}]}]\n",
            "[Pipeline] }\n",
            "Finished: FAILURE\n",
        );
        let parser = JenkinsParser;
        assert!(parser.can_parse(content));
        let events = parser.parse_workflow_log(content, &regs.tools);
        assert!(events.iter().all(|e| e.group == "main-build"));
        let delegated = events.iter().find(|e| e.subunit == "eslint").expect("delegated event");
        assert_eq!(delegated.hierarchy_level, 4);
        let step_line = events
            .iter()
            .find(|e| e.hierarchy_level == 3 && e.unit_id == delegated.parent_id)
            .expect("step-line event satisfying invariant 6 exists");
        assert_eq!(step_line.unit_id, delegated.parent_id);
        assert!(events.iter().any(|e| e.hierarchy_level == 1 && e.status == ValidationEventStatus::Error));
    }
}
