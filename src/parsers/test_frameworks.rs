//! Test-runner output parsers (spec.md §4.4's second leaf family). Two of
//! these are JSONL (one JSON object per line) rather than a single JSON
//! root, which is why they live in this module instead of `linting` even
//! though Clippy's shape otherwise looks like a linter.

use crate::model::{make_event, ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::parser::{priority, ToolParser};
use crate::registry::ToolParserRegistry;
use serde_json::Value;
use std::collections::HashMap;

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or("")
}

fn jsonl_objects(content: &str) -> impl Iterator<Item = Value> + '_ {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
}

/// `go test -json`: one object per line, `{Action,Package,Test,Elapsed,Output}`.
/// `Action` is `run`/`pass`/`fail`/`skip`/`output`; only terminal actions on a
/// named `Test` become events, per spec.md §4.4's test-correlation note.
pub struct GoTestJsonParser;

impl GoTestJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"Action\"") && content.contains("\"Package\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for obj in jsonl_objects(content) {
            let action = str_field(&obj, "Action");
            let test = str_field(&obj, "Test");
            if test.is_empty() || !matches!(action, "pass" | "fail" | "skip") {
                continue;
            }
            let mut e = make_event("go_test", ValidationEventType::TestResult);
            e.category = "go_test".to_string();
            e.test_name = test.to_string();
            e.ref_file = str_field(&obj, "Package").to_string();
            e.execution_time = obj.get("Elapsed").and_then(Value::as_f64).unwrap_or(0.0);
            match action {
                "pass" => e.set_outcome(ValidationEventStatus::Pass, ""),
                "fail" => e.set_outcome(ValidationEventStatus::Fail, "error"),
                "skip" => e.set_outcome(ValidationEventStatus::Skip, ""),
                _ => unreachable!(),
            }
            events.push(e);
        }
        events
    }
}

impl ToolParser for GoTestJsonParser {
    fn can_parse(&self, content: &str) -> bool {
        self.detect(content)
    }
    fn parse(&self, content: &str) -> Vec<ValidationEvent> {
        self.parse_impl(content)
    }
    fn format_name(&self) -> &'static str {
        "go_test"
    }
    fn name(&self) -> &'static str {
        "go_test"
    }
    fn category(&self) -> &'static str {
        "test_framework"
    }
    fn priority(&self) -> i32 {
        priority::VERY_HIGH
    }
}

/// `cargo test -- -Z unstable-options --format=json` / libtest-json:
/// `{type:"test",event:"started"|"ok"|"failed",name,exec_time}`. `started`
/// records carry no outcome and are dropped once correlated against the
/// matching terminal record for the same `name`, mirroring spec.md §8
/// scenario S2's description of the Go case generalized to Rust's runner.
pub struct CargoTestJsonParser;

impl CargoTestJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"type\":\"test\"") || content.contains("\"type\": \"test\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut pending: HashMap<String, f64> = HashMap::new();
        let mut events = Vec::new();
        for obj in jsonl_objects(content) {
            if str_field(&obj, "type") != "test" {
                continue;
            }
            let name = str_field(&obj, "name").to_string();
            match str_field(&obj, "event") {
                "started" => {
                    pending.insert(name, 0.0);
                }
                "ok" | "failed" | "ignored" => {
                    pending.remove(&name);
                    let mut e = make_event("cargo_test", ValidationEventType::TestResult);
                    e.category = "rust_test".to_string();
                    e.test_name = name;
                    e.execution_time = obj.get("exec_time").and_then(Value::as_f64).unwrap_or(0.0);
                    match str_field(&obj, "event") {
                        "ok" => e.set_outcome(ValidationEventStatus::Pass, ""),
                        "failed" => {
                            e.message = str_field(&obj, "stdout").to_string();
                            e.set_outcome(ValidationEventStatus::Fail, "error");
                        }
                        "ignored" => e.set_outcome(ValidationEventStatus::Skip, ""),
                        _ => unreachable!(),
                    }
                    events.push(e);
                }
                _ => {}
            }
        }
        events
    }
}

impl ToolParser for CargoTestJsonParser {
    fn can_parse(&self, content: &str) -> bool {
        self.detect(content)
    }
    fn parse(&self, content: &str) -> Vec<ValidationEvent> {
        self.parse_impl(content)
    }
    fn format_name(&self) -> &'static str {
        "cargo_test"
    }
    fn name(&self) -> &'static str {
        "cargo_test"
    }
    fn category(&self) -> &'static str {
        "test_framework"
    }
    fn priority(&self) -> i32 {
        priority::VERY_HIGH
    }
}

/// `cargo clippy --message-format=json`: JSONL of rustc-style diagnostics,
/// `{reason:"compiler-message",message:{code,level,message,spans:[{file_name,line_start,column_start}]}}`.
pub struct ClippyJsonParser;

impl ClippyJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"compiler-message\"") && content.contains("\"spans\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for obj in jsonl_objects(content) {
            if str_field(&obj, "reason") != "compiler-message" {
                continue;
            }
            let Some(message) = obj.get("message") else { continue };
            let level = str_field(message, "level");
            if level != "warning" && level != "error" {
                continue;
            }
            let mut e = make_event("clippy", ValidationEventType::LintIssue);
            e.category = "rust_lint".to_string();
            e.error_code = message
                .get("code")
                .and_then(|c| c.get("code"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            e.message = str_field(message, "message").to_string();
            if let Some(Value::Array(spans)) = message.get("spans") {
                if let Some(span) = spans.first() {
                    e.ref_file = str_field(span, "file_name").to_string();
                    e.ref_line = span.get("line_start").and_then(Value::as_i64).unwrap_or(-1) as i32;
                    e.ref_column = span.get("column_start").and_then(Value::as_i64).unwrap_or(-1) as i32;
                }
            }
            if level == "error" {
                e.set_outcome(ValidationEventStatus::Error, "error");
            } else {
                e.set_outcome(ValidationEventStatus::Warning, "warning");
            }
            events.push(e);
        }
        events
    }
}

impl ToolParser for ClippyJsonParser {
    fn can_parse(&self, content: &str) -> bool {
        self.detect(content)
    }
    fn parse(&self, content: &str) -> Vec<ValidationEvent> {
        self.parse_impl(content)
    }
    fn format_name(&self) -> &'static str {
        "clippy"
    }
    fn name(&self) -> &'static str {
        "clippy"
    }
    fn category(&self) -> &'static str {
        "linting_tool"
    }
    fn priority(&self) -> i32 {
        priority::VERY_HIGH
    }
}

/// pytest's `--json-report` single-document shape:
/// `{tests:[{nodeid,outcome,duration,call:{longrepr}}]}`.
pub struct PytestJsonParser;

impl PytestJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"nodeid\"") && content.contains("\"outcome\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Array(tests)) = root.get("tests") else {
            return Vec::new();
        };
        tests
            .iter()
            .map(|t| {
                let mut e = make_event("pytest", ValidationEventType::TestResult);
                e.category = "python_test".to_string();
                e.test_name = str_field(t, "nodeid").to_string();
                e.execution_time = t.get("duration").and_then(Value::as_f64).unwrap_or(0.0);
                match str_field(t, "outcome") {
                    "passed" => e.set_outcome(ValidationEventStatus::Pass, ""),
                    "skipped" => e.set_outcome(ValidationEventStatus::Skip, ""),
                    _ => {
                        if let Some(call) = t.get("call") {
                            e.message = str_field(call, "longrepr").to_string();
                        }
                        e.set_outcome(ValidationEventStatus::Fail, "error");
                    }
                }
                e
            })
            .collect()
    }
}

impl ToolParser for PytestJsonParser {
    fn can_parse(&self, content: &str) -> bool {
        self.detect(content)
    }
    fn parse(&self, content: &str) -> Vec<ValidationEvent> {
        self.parse_impl(content)
    }
    fn format_name(&self) -> &'static str {
        "pytest"
    }
    fn name(&self) -> &'static str {
        "pytest"
    }
    fn category(&self) -> &'static str {
        "test_framework"
    }
    fn priority(&self) -> i32 {
        priority::VERY_HIGH
    }
}

/// Jest's `--json` reporter: `{testResults:[{name,assertionResults:[{fullName,status,duration,failureMessages}]}]}`.
pub struct JestJsonParser;

impl JestJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"assertionResults\"") && content.contains("\"testResults\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Array(files)) = root.get("testResults") else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for file in files {
            let path = str_field(file, "name");
            let Some(Value::Array(assertions)) = file.get("assertionResults") else {
                continue;
            };
            for a in assertions {
                let mut e = make_event("jest", ValidationEventType::TestResult);
                e.category = "javascript_test".to_string();
                e.ref_file = path.to_string();
                e.test_name = str_field(a, "fullName").to_string();
                e.execution_time = a.get("duration").and_then(Value::as_f64).unwrap_or(0.0) / 1000.0;
                match str_field(a, "status") {
                    "passed" => e.set_outcome(ValidationEventStatus::Pass, ""),
                    "pending" | "skipped" => e.set_outcome(ValidationEventStatus::Skip, ""),
                    _ => {
                        let msgs = a
                            .get("failureMessages")
                            .and_then(Value::as_array)
                            .map(|m| m.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("\n"))
                            .unwrap_or_default();
                        e.message = msgs;
                        e.set_outcome(ValidationEventStatus::Fail, "error");
                    }
                }
                events.push(e);
            }
        }
        events
    }
}

impl ToolParser for JestJsonParser {
    fn can_parse(&self, content: &str) -> bool {
        self.detect(content)
    }
    fn parse(&self, content: &str) -> Vec<ValidationEvent> {
        self.parse_impl(content)
    }
    fn format_name(&self) -> &'static str {
        "jest"
    }
    fn name(&self) -> &'static str {
        "jest"
    }
    fn category(&self) -> &'static str {
        "test_framework"
    }
    fn priority(&self) -> i32 {
        priority::VERY_HIGH
    }
}

/// coverage.py's `coverage json` report: `{files:{"<path>":{summary:{percent_covered,missing_lines}}}}`.
/// Surfaced as `PerformanceMetric` rows (spec.md's catch-all for non-pass/fail
/// measurements) rather than `TestResult`, since coverage is not itself a test.
pub struct CoveragePyJsonParser;

impl CoveragePyJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"percent_covered\"") && content.contains("\"files\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Object(files)) = root.get("files") else {
            return Vec::new();
        };
        files
            .iter()
            .filter_map(|(path, detail)| {
                let summary = detail.get("summary")?;
                let percent = summary.get("percent_covered").and_then(Value::as_f64)?;
                let mut e = make_event("coverage_py", ValidationEventType::PerformanceMetric);
                e.category = "python_coverage".to_string();
                e.ref_file = path.clone();
                e.similarity_score = percent;
                e.message = format!("{percent:.1}% covered");
                e.set_outcome(ValidationEventStatus::Info, "info");
                Some(e)
            })
            .collect()
    }
}

impl ToolParser for CoveragePyJsonParser {
    fn can_parse(&self, content: &str) -> bool {
        self.detect(content)
    }
    fn parse(&self, content: &str) -> Vec<ValidationEvent> {
        self.parse_impl(content)
    }
    fn format_name(&self) -> &'static str {
        "coverage_py"
    }
    fn name(&self) -> &'static str {
        "coverage_py"
    }
    fn category(&self) -> &'static str {
        "test_framework"
    }
    fn priority(&self) -> i32 {
        priority::HIGH
    }
}

pub fn register(registry: &mut ToolParserRegistry) {
    registry.register(Box::new(GoTestJsonParser));
    registry.register(Box::new(CargoTestJsonParser));
    registry.register(Box::new(ClippyJsonParser));
    registry.register(Box::new(PytestJsonParser));
    registry.register(Box::new(JestJsonParser));
    registry.register(Box::new(CoveragePyJsonParser));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_test_correlates_started_and_terminal_records_spec_scenario_s2() {
        let content = concat!(
            r#"{"Action":"run","Package":"pkg","Test":"TestFoo"}"#, "\n",
            r#"{"Action":"output","Package":"pkg","Test":"TestFoo","Output":"=== RUN TestFoo\n"}"#, "\n",
            r#"{"Action":"pass","Package":"pkg","Test":"TestFoo","Elapsed":0.01}"#, "\n",
        );
        let parser = GoTestJsonParser;
        assert!(parser.can_parse(content));
        let events = parser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].test_name, "TestFoo");
        assert_eq!(events[0].status, ValidationEventStatus::Pass);
    }

    #[test]
    fn cargo_test_started_without_terminal_is_dropped() {
        let content = r#"{"type":"test","event":"started","name":"it_works"}"#;
        assert!(CargoTestJsonParser.parse(content).is_empty());
    }

    #[test]
    fn cargo_test_failed_carries_stdout_message() {
        let content = concat!(
            r#"{"type":"test","event":"started","name":"it_fails"}"#, "\n",
            r#"{"type":"test","name":"it_fails","event":"failed","exec_time":0.002,"stdout":"assertion failed"}"#,
        );
        let events = CargoTestJsonParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ValidationEventStatus::Fail);
        assert_eq!(events[0].message, "assertion failed");
    }

    #[test]
    fn clippy_jsonl_skips_non_diagnostic_lines() {
        let content = concat!(
            r#"{"reason":"compiler-artifact"}"#, "\n",
            r#"{"reason":"compiler-message","message":{"level":"warning","message":"unused `Result`","code":{"code":"unused_must_use"},"spans":[{"file_name":"src/lib.rs","line_start":10,"column_start":5}]}}"#,
        );
        let events = ClippyJsonParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ref_file, "src/lib.rs");
        assert_eq!(events[0].error_code, "unused_must_use");
    }

    #[test]
    fn jest_pending_test_is_skip() {
        let content = r#"{"testResults":[{"name":"a.test.js","assertionResults":[{"fullName":"a > b","status":"pending","duration":0}]}]}"#;
        let events = JestJsonParser.parse(content);
        assert_eq!(events[0].status, ValidationEventStatus::Skip);
    }

    #[test]
    fn malformed_json_does_not_panic() {
        assert!(PytestJsonParser.parse("{not json").is_empty());
        assert!(CoveragePyJsonParser.parse("[]").is_empty());
    }
}
