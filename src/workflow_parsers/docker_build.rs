//! Hierarchical Docker build transcript parser. Multi-stage builds
//! (`FROM ... AS name`) become groups; each `Step N/M : INSTRUCTION` within
//! a stage becomes a unit, mirroring `github_actions.rs`'s job/step split
//! one level deeper to cover stage nesting.

use crate::model::{ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::registry::ToolParserRegistry;
use crate::workflow::{create_base_event, WorkflowParser};
use once_cell::sync::Lazy;
use regex::Regex;

static STAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^FROM\s+\S+(?:\s+AS\s+(?P<name>\S+))?").unwrap());
static STEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Step (?P<n>\d+)/(?P<m>\d+) : (?P<instr>.*)$").unwrap());
static FAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"The command '.*' returned a non-zero code: (?P<code>\d+)").unwrap());

pub struct DockerBuildParser;

impl WorkflowParser for DockerBuildParser {
    fn can_parse(&self, content: &str) -> bool {
        content.lines().any(|l| STEP_RE.is_match(l))
    }

    fn parse_workflow_log(&self, content: &str, _registry: &ToolParserRegistry) -> Vec<ValidationEvent> {
        let scope_id = "build-0".to_string();
        let mut events = Vec::new();
        let mut stage_name = "default".to_string();
        let mut stage_id = format!("{scope_id}-stage-0");
        let mut stage_index = 0;
        let mut current_instr = String::new();
        let mut step_line = 0i32;

        for (line_no, line) in content.lines().enumerate() {
            let line_no = (line_no + 1) as i32;
            if let Some(caps) = STAGE_RE.captures(line) {
                stage_name = caps
                    .name("name")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| format!("stage{stage_index}"));
                stage_id = format!("{scope_id}-stage-{stage_index}");
                stage_index += 1;
                continue;
            }
            if let Some(caps) = STEP_RE.captures(line) {
                current_instr = caps["instr"].to_string();
                step_line = line_no;
                let mut e = create_base_event("docker_build", ValidationEventType::Summary, "docker_build", 2);
                e.scope = "image".to_string();
                e.group = stage_name.clone();
                e.group_id = stage_id.clone();
                e.unit = current_instr.clone();
                e.unit_id = format!("{stage_id}-step-{}", &caps["n"]);
                e.parent_id = stage_id.clone();
                e.log_line_start = line_no;
                e.log_line_end = line_no;
                e.message = current_instr.clone();
                e.set_outcome(ValidationEventStatus::Pass, "");
                events.push(e);
                continue;
            }
            if let Some(caps) = FAIL_RE.captures(line) {
                let mut e = create_base_event("docker_build", ValidationEventType::BuildError, "docker_build", 3);
                e.scope = "image".to_string();
                e.group = stage_name.clone();
                e.group_id = stage_id.clone();
                e.unit = current_instr.clone();
                e.parent_id = stage_id.clone();
                e.error_code = caps["code"].to_string();
                e.log_line_start = step_line;
                e.log_line_end = line_no;
                e.message = format!("step failed: {current_instr}");
                e.set_outcome(ValidationEventStatus::Error, "error");
                events.push(e);
            }
        }
        events
    }

    fn format_name(&self) -> &'static str {
        "docker_build"
    }

    fn name(&self) -> &'static str {
        "docker_build"
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
    fn multi_stage_build_groups_steps_by_stage() {
        let regs = Registries::bootstrap();
        let content = "FROM golang:1.21 AS builder\nStep 1/5 : FROM golang:1.21\nStep 2/5 : RUN go build\nThe command '/bin/sh -c go build' returned a non-zero code: 2\n";
        let parser = DockerBuildParser;
        assert!(parser.can_parse(content));
        let events = parser.parse_workflow_log(content, &regs.tools);
        assert!(events.iter().any(|e| e.group == "builder"));
        assert!(events.iter().any(|e| e.status == ValidationEventStatus::Error && e.error_code == "2"));
    }
}
