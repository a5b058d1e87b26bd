//! Flat (non-hierarchical) CI/build transcript parsers — spec.md §4.4's
//! sixth leaf family. `original_source/src/ci_systems/*_text_parser.cpp`
//! keeps one of these alongside each hierarchical `workflow_engines/*`
//! counterpart for transcripts consumed without job/step structure (e.g. a
//! single step's captured log, not the full run); SPEC_FULL.md §3 carries
//! that duplication forward rather than collapsing it.

use crate::common::{map_level_to_severity, numbered_lines};
use crate::model::{make_event, ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::parser::{priority, ToolParser};
use crate::registry::ToolParserRegistry;
use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! parser_meta {
    ($ty:ident, $name:expr, $category:expr, $priority:expr) => {
        impl ToolParser for $ty {
            fn can_parse(&self, content: &str) -> bool {
                self.detect(content)
            }
            fn parse(&self, content: &str) -> Vec<ValidationEvent> {
                self.parse_impl(content)
            }
            fn format_name(&self) -> &'static str {
                $name
            }
            fn name(&self) -> &'static str {
                $name
            }
            fn category(&self) -> &'static str {
                $category
            }
            fn priority(&self) -> i32 {
                $priority
            }
        }
    };
}

/// `docker build` plain text output: `Step N/M : INSTRUCTION args` steps,
/// terminated by `The command '...' returned a non-zero code: N` on failure.
static DOCKER_STEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Step (?P<n>\d+)/(?P<m>\d+) : (?P<instr>.*)$").unwrap());
static DOCKER_FAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"The command '.*' returned a non-zero code: (?P<code>\d+)").unwrap());

pub struct DockerBuildTextParser;

impl DockerBuildTextParser {
    fn detect(&self, content: &str) -> bool {
        content.lines().any(|l| DOCKER_STEP_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        let mut current_instr = String::new();
        let mut step_line = 0usize;
        for (line_no, line) in numbered_lines(content) {
            if let Some(caps) = DOCKER_STEP_RE.captures(line) {
                current_instr = caps["instr"].to_string();
                step_line = line_no;
                continue;
            }
            if let Some(caps) = DOCKER_FAIL_RE.captures(line) {
                let mut e = make_event("docker_build", ValidationEventType::BuildError);
                e.category = "ci_system".to_string();
                e.message = format!("step failed: {current_instr}");
                e.error_code = caps["code"].to_string();
                e.log_line_start = step_line as i32;
                e.log_line_end = line_no as i32;
                e.log_content = line.to_string();
                e.set_outcome(ValidationEventStatus::Error, "error");
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(DockerBuildTextParser, "docker_build_text", "ci_system", priority::HIGH);

/// GitHub Actions flat transcript: `##[error]msg` / `##[warning]msg` lines
/// without the `##[group]`/`##[endgroup]` job/step nesting the hierarchical
/// `workflow_parsers::github_actions` parser reconstructs.
static GHA_ANNOTATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^##\[(?P<level>error|warning|notice)\](?P<msg>.*)$").unwrap());

pub struct GithubActionsTextParser;

impl GithubActionsTextParser {
    fn detect(&self, content: &str) -> bool {
        content.lines().any(|l| GHA_ANNOTATION_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = GHA_ANNOTATION_RE.captures(line) else { continue };
            let mut e = make_event("github_actions_text", ValidationEventType::BuildError);
            e.category = "ci_system".to_string();
            e.message = caps["msg"].trim().to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            match &caps["level"] {
                "error" => e.set_outcome(ValidationEventStatus::Error, "error"),
                "warning" => e.set_outcome(ValidationEventStatus::Warning, "warning"),
                _ => e.set_outcome(ValidationEventStatus::Info, "info"),
            }
            events.push(e);
        }
        events
    }
}
parser_meta!(GithubActionsTextParser, "github_actions_text", "ci_system", priority::HIGH);

/// GitLab CI flat transcript: `ERROR: Job failed: ...` and
/// `section_start:TIME:NAME` / `section_end:TIME:NAME` markers without the
/// job-level grouping the hierarchical parser reconstructs.
static GITLAB_ERROR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ERROR: (?P<msg>.*)$").unwrap());

pub struct GitlabCiTextParser;

impl GitlabCiTextParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("section_start:") || content.contains("Running with gitlab-runner")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = GITLAB_ERROR_RE.captures(line) else { continue };
            let mut e = make_event("gitlab_ci_text", ValidationEventType::BuildError);
            e.category = "ci_system".to_string();
            e.message = caps["msg"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.set_outcome(ValidationEventStatus::Error, "error");
            events.push(e);
        }
        events
    }
}
parser_meta!(GitlabCiTextParser, "gitlab_ci_text", "ci_system", priority::HIGH);

/// Jenkins flat console output: `[ERROR] msg` / `[WARNING] msg` lines and
/// the terminal `Finished: SUCCESS`/`Finished: FAILURE` marker.
static JENKINS_BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(?P<level>ERROR|WARNING)\]\s*(?P<msg>.*)$").unwrap());

pub struct JenkinsTextParser;

impl JenkinsTextParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("Started by") || content.contains("Finished: SUCCESS") || content.contains("Finished: FAILURE")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            if let Some(caps) = JENKINS_BRACKET_RE.captures(line) {
                let mut e = make_event("jenkins_text", ValidationEventType::BuildError);
                e.category = "ci_system".to_string();
                e.message = caps["msg"].to_string();
                e.log_line_start = line_no as i32;
                e.log_line_end = line_no as i32;
                e.log_content = line.to_string();
                let (status, sev) = map_level_to_severity(&caps["level"]);
                e.set_outcome(status, sev);
                events.push(e);
                continue;
            }
            if line.trim() == "Finished: FAILURE" {
                let mut e = make_event("jenkins_text", ValidationEventType::Summary);
                e.category = "ci_system".to_string();
                e.message = "build finished: FAILURE".to_string();
                e.log_line_start = line_no as i32;
                e.log_line_end = line_no as i32;
                e.set_outcome(ValidationEventStatus::Error, "error");
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(JenkinsTextParser, "jenkins_text", "ci_system", priority::HIGH);

/// Drone CI flat transcript: `+ command` lines followed by `exit code N` on
/// failure.
static DRONE_CMD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+ (?P<cmd>.*)$").unwrap());
static DRONE_EXIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"exit code (?P<code>\d+)").unwrap());

pub struct DroneTextParser;

impl DroneTextParser {
    fn detect(&self, content: &str) -> bool {
        content.lines().any(|l| DRONE_CMD_RE.is_match(l)) && content.contains("exit code")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        let mut current_cmd = String::new();
        let mut cmd_line = 0usize;
        for (line_no, line) in numbered_lines(content) {
            if let Some(caps) = DRONE_CMD_RE.captures(line) {
                current_cmd = caps["cmd"].to_string();
                cmd_line = line_no;
                continue;
            }
            if let Some(caps) = DRONE_EXIT_RE.captures(line) {
                let code: i32 = caps["code"].parse().unwrap_or(1);
                if code == 0 {
                    continue;
                }
                let mut e = make_event("drone_text", ValidationEventType::BuildError);
                e.category = "ci_system".to_string();
                e.message = format!("command failed: {current_cmd}");
                e.error_code = code.to_string();
                e.log_line_start = cmd_line as i32;
                e.log_line_end = line_no as i32;
                e.log_content = line.to_string();
                e.set_outcome(ValidationEventStatus::Error, "error");
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(DroneTextParser, "drone_text", "ci_system", priority::HIGH);

/// `terraform plan`/`apply` console output: `Error: message` / `Warning: message`
/// blocks, each optionally followed by an indented " on file.tf line N" locator.
static TF_DIAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<level>Error|Warning): (?P<msg>.*)$").unwrap());
static TF_LOCATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"on (?P<file>\S+\.tf) line (?P<line>\d+)").unwrap());

pub struct TerraformTextParser;

impl TerraformTextParser {
    fn detect(&self, content: &str) -> bool {
        content.lines().any(|l| TF_DIAG_RE.is_match(l)) && content.contains(".tf")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let lines: Vec<&str> = content.lines().collect();
        let mut events = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            if let Some(caps) = TF_DIAG_RE.captures(lines[i]) {
                let mut e = make_event("terraform_text", ValidationEventType::BuildError);
                e.category = "ci_system".to_string();
                e.message = caps["msg"].to_string();
                e.log_line_start = (i + 1) as i32;
                if let Some(loc) = lines.get(i + 1).and_then(|l| TF_LOCATION_RE.captures(l)) {
                    e.ref_file = loc["file"].to_string();
                    e.ref_line = loc["line"].parse().unwrap_or(-1);
                }
                e.log_line_end = (i + 1) as i32;
                e.log_content = lines[i].to_string();
                match &caps["level"] {
                    "Error" => e.set_outcome(ValidationEventStatus::Error, "error"),
                    _ => e.set_outcome(ValidationEventStatus::Warning, "warning"),
                }
                events.push(e);
            }
            i += 1;
        }
        events
    }
}
parser_meta!(TerraformTextParser, "terraform_text", "ci_system", priority::HIGH);

/// GNU Make console output: `make: *** [target] Error N` and
/// `make[K]: Entering directory '...'` recursion markers.
static MAKE_ERROR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^make(?:\[\d+\])?: \*\*\* \[(?P<target>[^\]]+)\] Error (?P<code>\d+)").unwrap());

pub struct MakeTextParser;

impl MakeTextParser {
    fn detect(&self, content: &str) -> bool {
        content.lines().any(|l| MAKE_ERROR_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = MAKE_ERROR_RE.captures(line) else { continue };
            let mut e = make_event("make_text", ValidationEventType::BuildError);
            e.category = "ci_system".to_string();
            e.function_name = caps["target"].to_string();
            e.error_code = caps["code"].to_string();
            e.message = format!("target '{}' failed", &caps["target"]);
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.set_outcome(ValidationEventStatus::Error, "error");
            events.push(e);
        }
        events
    }
}
parser_meta!(MakeTextParser, "make_text", "ci_system", priority::HIGH);

pub fn register(registry: &mut ToolParserRegistry) {
    registry.register(Box::new(DockerBuildTextParser));
    registry.register(Box::new(GithubActionsTextParser));
    registry.register(Box::new(GitlabCiTextParser));
    registry.register(Box::new(JenkinsTextParser));
    registry.register(Box::new(DroneTextParser));
    registry.register(Box::new(TerraformTextParser));
    registry.register(Box::new(MakeTextParser));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docker_build_failure_captures_failing_instruction() {
        let content = "Step 3/10 : RUN npm install\n---> running\nThe command '/bin/sh -c npm install' returned a non-zero code: 1\n";
        assert!(DockerBuildTextParser.can_parse(content));
        let events = DockerBuildTextParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "step failed: RUN npm install");
        assert_eq!(events[0].error_code, "1");
    }

    #[test]
    fn github_actions_text_error_annotation() {
        let content = "##[group]Build\n##[error]compilation failed\n##[endgroup]\n";
        let events = GithubActionsTextParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ValidationEventStatus::Error);
    }

    #[test]
    fn terraform_text_captures_file_location() {
        let content = "Error: Missing required argument\n  on main.tf line 12, in resource:\n";
        let events = TerraformTextParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ref_file, "main.tf");
        assert_eq!(events[0].ref_line, 12);
    }

    #[test]
    fn make_text_captures_target_and_code() {
        let content = "gcc -c foo.c\nmake: *** [foo.o] Error 1\n";
        let events = MakeTextParser.parse(content);
        assert_eq!(events[0].function_name, "foo.o");
        assert_eq!(events[0].error_code, "1");
    }

    #[test]
    fn drone_text_ignores_zero_exit_code() {
        let content = "+ echo hi\nhi\nexit code 0\n";
        assert!(DroneTextParser.parse(content).is_empty());
    }
}
