//! Hierarchical Spack build-log parser. `==> Installing pkg` marks a
//! package-level group, `==> Executing phase: 'name'` marks a phase-level
//! unit within it, and Spack echoes each subprocess invocation as
//! `==> 'argv0' 'argv1' ...` — reassembled into a single command string and
//! resolved against the tool registry's `CommandPattern`s, the same
//! delegation shape `jenkins.rs` uses.

use crate::model::{ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::registry::ToolParserRegistry;
use crate::workflow::{create_base_event, WorkflowParser};
use once_cell::sync::Lazy;
use regex::Regex;

static INSTALLING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^==> Installing (?P<pkg>\S+)").unwrap());
static PHASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^==> Executing phase: '(?P<phase>[^']+)'").unwrap());
static ARGV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^==> ('[^']*'(?:\s+'[^']*')*)\s*$").unwrap());
static ERROR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^==> Error: (?P<msg>.*)$").unwrap());

fn join_argv(captured: &str) -> String {
    captured
        .split('\'')
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct SpackParser;

impl WorkflowParser for SpackParser {
    fn can_parse(&self, content: &str) -> bool {
        content.contains("==> ") && content.contains("Executing phase:")
    }

    fn parse_workflow_log(&self, content: &str, registry: &ToolParserRegistry) -> Vec<ValidationEvent> {
        let scope_id = "spack-0".to_string();
        let mut events = Vec::new();
        let mut pkg_name = "package".to_string();
        let mut pkg_id = format!("{scope_id}-pkg-0");
        let mut pkg_index = 0;
        let mut phase_name = String::new();
        let mut phase_id = String::new();
        let mut phase_index = 0;

        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            if let Some(caps) = INSTALLING_RE.captures(line) {
                pkg_name = caps["pkg"].to_string();
                pkg_id = format!("{scope_id}-pkg-{pkg_index}");
                pkg_index += 1;
                i += 1;
                continue;
            }
            if let Some(caps) = PHASE_RE.captures(line) {
                phase_name = caps["phase"].to_string();
                phase_id = format!("{pkg_id}-phase-{phase_index}");
                phase_index += 1;
                let mut e = create_base_event("spack", ValidationEventType::Summary, "spack", 2);
                e.scope = "build".to_string();
                e.group = pkg_name.clone();
                e.group_id = pkg_id.clone();
                e.unit = phase_name.clone();
                e.unit_id = phase_id.clone();
                e.parent_id = pkg_id.clone();
                e.message = format!("phase: {phase_name}");
                e.set_outcome(ValidationEventStatus::Pass, "");
                events.push(e);
                i += 1;
                continue;
            }
            if let Some(caps) = ERROR_RE.captures(line) {
                let mut e = create_base_event("spack", ValidationEventType::BuildError, "spack", 2);
                e.scope = "build".to_string();
                e.group = pkg_name.clone();
                e.group_id = pkg_id.clone();
                e.unit = phase_name.clone();
                e.unit_id = phase_id.clone();
                e.parent_id = pkg_id.clone();
                e.message = caps["msg"].to_string();
                e.set_outcome(ValidationEventStatus::Error, "error");
                events.push(e);
                i += 1;
                continue;
            }
            if let Some(caps) = ARGV_RE.captures(line) {
                let command = join_argv(&caps[1]);
                if let Some(parser) = registry.find_parser_by_command(&command) {
                    let mut end = lines.len();
                    for (offset, later) in lines.iter().enumerate().skip(i + 1) {
                        if INSTALLING_RE.is_match(later) || PHASE_RE.is_match(later) || ARGV_RE.is_match(later) {
                            end = offset;
                            break;
                        }
                    }
                    let output = lines[i + 1..end].join("\n");
                    let cmd_id = format!("{phase_id}-cmd-{i}");

                    let mut cmd_event = create_base_event("spack", ValidationEventType::DebugInfo, "spack", 3);
                    cmd_event.scope = "build".to_string();
                    cmd_event.group = pkg_name.clone();
                    cmd_event.group_id = pkg_id.clone();
                    cmd_event.unit = phase_name.clone();
                    cmd_event.unit_id = cmd_id.clone();
                    cmd_event.parent_id = phase_id.clone();
                    cmd_event.message = format!("command: {command}");
                    cmd_event.set_outcome(ValidationEventStatus::Pass, "");
                    events.push(cmd_event);

                    for mut delegated in parser.parse(&output) {
                        delegated.scope = "build".to_string();
                        delegated.group = pkg_name.clone();
                        delegated.group_id = pkg_id.clone();
                        delegated.unit = phase_name.clone();
                        delegated.unit_id = cmd_id.clone();
                        delegated.subunit = parser.name().to_string();
                        delegated.parent_id = cmd_id.clone();
                        delegated.workflow_type = "spack".to_string();
                        delegated.hierarchy_level = 4;
                        delegated.structured_data = parser.name().to_string();
                        events.push(delegated);
                    }
                    i = end;
                    continue;
                }
            }
            i += 1;
        }
        events
    }

    fn format_name(&self) -> &'static str {
        "spack"
    }

    fn name(&self) -> &'static str {
        "spack"
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
    fn join_argv_strips_quotes() {
        assert_eq!(join_argv("'shellcheck' '-f' 'json' 'build.sh'"), "shellcheck -f json build.sh");
    }

    #[test]
    fn delegates_phase_command_to_registered_tool() {
        let regs = Registries::bootstrap();
        let content = concat!(
            "==> Installing mypkg\n",
            "==> Executing phase: 'build'\n",
            "==> 'shellcheck' '-f' 'json' 'build.sh'\n",
            r#"[{"file":"build.sh","line":1,"column":1,"level":"error","code":2154,"message":"var is unset"}]"#, "\n",
        );
        let parser = SpackParser;
        assert!(parser.can_parse(content));
        let events = parser.parse_workflow_log(content, &regs.tools);
        let delegated = events.iter().find(|e| e.subunit == "shellcheck").expect("delegated event");
        assert_eq!(delegated.hierarchy_level, 4);
        let cmd_line = events
            .iter()
            .find(|e| e.hierarchy_level == 3 && e.unit_id == delegated.parent_id)
            .expect("step-line event satisfying invariant 6 exists");
        assert_eq!(cmd_line.unit_id, delegated.parent_id);
    }

    #[test]
    fn captures_explicit_error_lines() {
        let regs = Registries::bootstrap();
        let content = "==> Installing mypkg\n==> Executing phase: 'install'\n==> Error: Command exited with status 1\n";
        let events = SpackParser.parse_workflow_log(content, &regs.tools);
        assert!(events.iter().any(|e| e.status == ValidationEventStatus::Error));
    }
}
