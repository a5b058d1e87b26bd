//! JSON-root linter/static-analysis parsers (spec.md §4.4's first leaf
//! family). Each parser's `can_parse` checks a couple of discriminator
//! keys cheaply before `parse` commits to walking the shape with
//! `serde_json`, per spec.md §9's "JSON access" design note.

use crate::common::map_level_to_severity;
use crate::model::{make_event, ValidationEvent, ValidationEventStatus, ValidationEventType};
use crate::parser::{priority, CommandPattern, ToolParser};
use crate::registry::ToolParserRegistry;
use serde_json::Value;

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
    ($ty:ident, $name:expr, $category:expr, $priority:expr, commands: [$($p:expr),+ $(,)?]) => {
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
            fn command_patterns(&self) -> Vec<CommandPattern> {
                vec![$(CommandPattern::Like($p.to_string())),+]
            }
        }
    };
}

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or("")
}

fn i32_field(v: &Value, key: &str) -> i32 {
    v.get(key).and_then(Value::as_i64).map(|n| n as i32).unwrap_or(-1)
}

/// S1 of spec.md §8: `[{"filePath":...,"messages":[{"ruleId",...}]}]`.
pub struct EslintJsonParser;

impl EslintJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"filePath\"") && content.contains("\"messages\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(files)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for file in &files {
            let path = str_field(file, "filePath");
            let Some(Value::Array(messages)) = file.get("messages") else {
                continue;
            };
            for msg in messages {
                let mut e = make_event("eslint", ValidationEventType::LintIssue);
                e.category = "javascript_lint".to_string();
                e.ref_file = path.to_string();
                e.ref_line = i32_field(msg, "line");
                e.ref_column = i32_field(msg, "column");
                e.error_code = str_field(msg, "ruleId").to_string();
                e.message = str_field(msg, "message").to_string();
                let sev = msg.get("severity").and_then(Value::as_i64).unwrap_or(1);
                if sev >= 2 {
                    e.set_outcome(ValidationEventStatus::Error, "error");
                } else {
                    e.set_outcome(ValidationEventStatus::Warning, "warning");
                }
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(EslintJsonParser, "eslint", "linting_tool", priority::VERY_HIGH, commands: ["eslint%"]);

/// Ruff `--output-format=json`: array of `{filename, code, message, location:{row,column}}`.
pub struct RuffJsonParser;

impl RuffJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"filename\"") && content.contains("\"location\"") && content.contains("\"code\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| {
                let mut e = make_event("ruff", ValidationEventType::LintIssue);
                e.category = "python_lint".to_string();
                e.ref_file = str_field(item, "filename").to_string();
                if let Some(loc) = item.get("location") {
                    e.ref_line = i32_field(loc, "row");
                    e.ref_column = i32_field(loc, "column");
                }
                e.error_code = str_field(item, "code").to_string();
                e.message = str_field(item, "message").to_string();
                e.set_outcome(ValidationEventStatus::Warning, "warning");
                e
            })
            .collect()
    }
}
parser_meta!(RuffJsonParser, "ruff", "linting_tool", priority::VERY_HIGH, commands: ["ruff%"]);

/// Hadolint `-f json`: array of `{file,line,column,level,code,message}`.
pub struct HadolintJsonParser;

impl HadolintJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"code\"") && content.contains("\"level\"") && content.contains("DL")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| {
                let mut e = make_event("hadolint", ValidationEventType::LintIssue);
                e.category = "docker_lint".to_string();
                e.ref_file = str_field(item, "file").to_string();
                e.ref_line = i32_field(item, "line");
                e.ref_column = i32_field(item, "column");
                e.error_code = str_field(item, "code").to_string();
                e.message = str_field(item, "message").to_string();
                let (status, sev) = map_level_to_severity(str_field(item, "level"));
                e.set_outcome(status, sev);
                e
            })
            .collect()
    }
}
parser_meta!(HadolintJsonParser, "hadolint", "linting_tool", priority::VERY_HIGH, commands: ["hadolint%"]);

/// lintr's `as.data.frame`-style JSON export: array of R lint objects.
pub struct LintrJsonParser;

impl LintrJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"filename\"") && content.contains("\"line_number\"") && content.contains("\"linter\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| {
                let mut e = make_event("lintr", ValidationEventType::LintIssue);
                e.category = "r_lint".to_string();
                e.ref_file = str_field(item, "filename").to_string();
                e.ref_line = i32_field(item, "line_number");
                e.ref_column = i32_field(item, "column_number");
                e.error_code = str_field(item, "linter").to_string();
                e.message = str_field(item, "message").to_string();
                let (status, sev) = map_level_to_severity(str_field(item, "type"));
                e.set_outcome(status, sev);
                e
            })
            .collect()
    }
}
parser_meta!(LintrJsonParser, "lintr", "linting_tool", priority::VERY_HIGH);

/// sqlfluff `-f json`: array of `{filepath, violations:[{line_no,line_pos,code,description}]}`.
pub struct SqlfluffJsonParser;

impl SqlfluffJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"filepath\"") && content.contains("\"violations\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(files)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for file in &files {
            let path = str_field(file, "filepath");
            let Some(Value::Array(violations)) = file.get("violations") else {
                continue;
            };
            for v in violations {
                let mut e = make_event("sqlfluff", ValidationEventType::LintIssue);
                e.category = "sql_lint".to_string();
                e.ref_file = path.to_string();
                e.ref_line = i32_field(v, "line_no");
                e.ref_column = i32_field(v, "line_pos");
                e.error_code = str_field(v, "code").to_string();
                e.message = str_field(v, "description").to_string();
                e.set_outcome(ValidationEventStatus::Warning, "warning");
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(SqlfluffJsonParser, "sqlfluff", "linting_tool", priority::VERY_HIGH);

/// tflint `-f json`: `{issues:[{rule:{name,severity},message,range:{filename,start:{line,column}}}]}`.
pub struct TflintJsonParser;

impl TflintJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"issues\"") && content.contains("\"range\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Array(issues)) = root.get("issues") else {
            return Vec::new();
        };
        issues
            .iter()
            .map(|issue| {
                let mut e = make_event("tflint", ValidationEventType::LintIssue);
                e.category = "terraform_lint".to_string();
                if let Some(range) = issue.get("range") {
                    e.ref_file = str_field(range, "filename").to_string();
                    if let Some(start) = range.get("start") {
                        e.ref_line = i32_field(start, "line");
                        e.ref_column = i32_field(start, "column");
                    }
                }
                e.message = str_field(issue, "message").to_string();
                if let Some(rule) = issue.get("rule") {
                    e.error_code = str_field(rule, "name").to_string();
                    let (status, sev) = map_level_to_severity(str_field(rule, "severity"));
                    e.set_outcome(status, sev);
                } else {
                    e.set_outcome(ValidationEventStatus::Warning, "warning");
                }
                e
            })
            .collect()
    }
}
parser_meta!(TflintJsonParser, "tflint", "linting_tool", priority::VERY_HIGH);

/// RuboCop `--format json`: `{files:[{path,offenses:[{severity,message,cop_name,location:{line,column}}]}]}`.
pub struct RubocopJsonParser;

impl RubocopJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"cop_name\"") && content.contains("\"offenses\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Array(files)) = root.get("files") else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for file in files {
            let path = str_field(file, "path");
            let Some(Value::Array(offenses)) = file.get("offenses") else {
                continue;
            };
            for off in offenses {
                let mut e = make_event("rubocop", ValidationEventType::LintIssue);
                e.category = "ruby_lint".to_string();
                e.ref_file = path.to_string();
                if let Some(loc) = off.get("location") {
                    e.ref_line = i32_field(loc, "line");
                    e.ref_column = i32_field(loc, "column");
                }
                e.error_code = str_field(off, "cop_name").to_string();
                e.message = str_field(off, "message").to_string();
                let (status, sev) = map_level_to_severity(str_field(off, "severity"));
                e.set_outcome(status, sev);
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(RubocopJsonParser, "rubocop", "linting_tool", priority::VERY_HIGH);

/// Bandit `-f json`: `{results:[{filename,issue_severity,issue_text,line_number,test_id}]}`.
pub struct BanditJsonParser;

impl BanditJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"issue_severity\"") && content.contains("\"test_id\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Array(results)) = root.get("results") else {
            return Vec::new();
        };
        results
            .iter()
            .map(|r| {
                let mut e = make_event("bandit", ValidationEventType::SecurityFinding);
                e.category = "python_security".to_string();
                e.ref_file = str_field(r, "filename").to_string();
                e.ref_line = i32_field(r, "line_number");
                e.error_code = str_field(r, "test_id").to_string();
                e.message = str_field(r, "issue_text").to_string();
                let (status, sev) = map_level_to_severity(str_field(r, "issue_severity"));
                e.set_outcome(status, sev);
                e
            })
            .collect()
    }
}
parser_meta!(BanditJsonParser, "bandit", "security_tool", priority::VERY_HIGH, commands: ["bandit%"]);

/// SpotBugs JSON export: `{bugs:[{type,priority,class,line,message}]}`.
pub struct SpotbugsJsonParser;

impl SpotbugsJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"bugs\"") && content.contains("\"priority\"") && content.contains("\"class\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Array(bugs)) = root.get("bugs") else {
            return Vec::new();
        };
        bugs.iter()
            .map(|b| {
                let mut e = make_event("spotbugs", ValidationEventType::LintIssue);
                e.category = "java_lint".to_string();
                e.ref_file = str_field(b, "class").to_string();
                e.ref_line = i32_field(b, "line");
                e.error_code = str_field(b, "type").to_string();
                e.message = str_field(b, "message").to_string();
                let priority_num = b.get("priority").and_then(Value::as_i64).unwrap_or(3);
                if priority_num <= 1 {
                    e.set_outcome(ValidationEventStatus::Error, "error");
                } else {
                    e.set_outcome(ValidationEventStatus::Warning, "warning");
                }
                e
            })
            .collect()
    }
}
parser_meta!(SpotbugsJsonParser, "spotbugs", "linting_tool", priority::VERY_HIGH);

/// Trivy `-f json`: `{Results:[{Target,Vulnerabilities:[{VulnerabilityID,Severity,Title,PkgName}]}]}`.
pub struct TrivyJsonParser;

impl TrivyJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"Vulnerabilities\"") && content.contains("\"VulnerabilityID\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Array(results)) = root.get("Results") else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for result in results {
            let target = str_field(result, "Target");
            let Some(Value::Array(vulns)) = result.get("Vulnerabilities") else {
                continue;
            };
            for v in vulns {
                let mut e = make_event("trivy", ValidationEventType::SecurityFinding);
                e.category = "vulnerability_scan".to_string();
                e.ref_file = target.to_string();
                e.error_code = str_field(v, "VulnerabilityID").to_string();
                e.message = format!("{} ({})", str_field(v, "Title"), str_field(v, "PkgName"));
                let (status, sev) = map_level_to_severity(str_field(v, "Severity"));
                e.set_outcome(status, sev);
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(TrivyJsonParser, "trivy", "security_tool", priority::VERY_HIGH, commands: ["trivy%"]);

/// stylelint `--formatter json`: array of `{source,warnings:[{line,column,rule,severity,text}]}`.
pub struct StylelintJsonParser;

impl StylelintJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"source\"") && content.contains("\"warnings\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(files)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for file in &files {
            let path = str_field(file, "source");
            let Some(Value::Array(warnings)) = file.get("warnings") else {
                continue;
            };
            for w in warnings {
                let mut e = make_event("stylelint", ValidationEventType::LintIssue);
                e.category = "css_lint".to_string();
                e.ref_file = path.to_string();
                e.ref_line = i32_field(w, "line");
                e.ref_column = i32_field(w, "column");
                e.error_code = str_field(w, "rule").to_string();
                e.message = str_field(w, "text").to_string();
                let (status, sev) = map_level_to_severity(str_field(w, "severity"));
                e.set_outcome(status, sev);
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(StylelintJsonParser, "stylelint", "linting_tool", priority::VERY_HIGH);

/// markdownlint `-j`: object keyed by filename -> array of
/// `{lineNumber,ruleNames,ruleDescription,errorDetail}`.
pub struct MarkdownlintJsonParser;

impl MarkdownlintJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"lineNumber\"") && content.contains("\"ruleNames\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Object(files)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for (path, issues) in &files {
            let Value::Array(issues) = issues else { continue };
            for issue in issues {
                let mut e = make_event("markdownlint", ValidationEventType::LintIssue);
                e.category = "markdown_lint".to_string();
                e.ref_file = path.clone();
                e.ref_line = i32_field(issue, "lineNumber");
                let rule_names = issue
                    .get("ruleNames")
                    .and_then(Value::as_array)
                    .map(|a| a.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("/"))
                    .unwrap_or_default();
                e.error_code = rule_names;
                e.message = str_field(issue, "ruleDescription").to_string();
                e.set_outcome(ValidationEventStatus::Warning, "warning");
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(MarkdownlintJsonParser, "markdownlint", "linting_tool", priority::VERY_HIGH);

/// yamllint `-f` json-like output (via a json plugin formatter): array of
/// `{path,line,column,level,rule,message}`.
pub struct YamllintJsonParser;

impl YamllintJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"level\"") && content.contains("\"rule\"") && content.contains("yaml")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| {
                let mut e = make_event("yamllint", ValidationEventType::LintIssue);
                e.category = "yaml_lint".to_string();
                e.ref_file = str_field(item, "path").to_string();
                e.ref_line = i32_field(item, "line");
                e.ref_column = i32_field(item, "column");
                e.error_code = str_field(item, "rule").to_string();
                e.message = str_field(item, "message").to_string();
                let (status, sev) = map_level_to_severity(str_field(item, "level"));
                e.set_outcome(status, sev);
                e
            })
            .collect()
    }
}
parser_meta!(YamllintJsonParser, "yamllint", "linting_tool", priority::HIGH);

/// SwiftLint `--reporter json`: array of `{file,line,character,severity,type,reason,rule_id}`.
pub struct SwiftlintJsonParser;

impl SwiftlintJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"rule_id\"") && content.contains("\"character\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| {
                let mut e = make_event("swiftlint", ValidationEventType::LintIssue);
                e.category = "swift_lint".to_string();
                e.ref_file = str_field(item, "file").to_string();
                e.ref_line = i32_field(item, "line");
                e.ref_column = i32_field(item, "character");
                e.error_code = str_field(item, "rule_id").to_string();
                e.message = str_field(item, "reason").to_string();
                let (status, sev) = map_level_to_severity(str_field(item, "severity"));
                e.set_outcome(status, sev);
                e
            })
            .collect()
    }
}
parser_meta!(SwiftlintJsonParser, "swiftlint", "linting_tool", priority::VERY_HIGH);

/// PHPStan `--error-format=json`: `{files:{"<path>":{errors:[{message,line}]}}}`.
pub struct PhpstanJsonParser;

impl PhpstanJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"files\"") && content.contains("\"errors\"") && content.contains("\"message\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Object(files)) = root.get("files") else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for (path, detail) in files {
            let Some(Value::Array(errors)) = detail.get("errors") else {
                continue;
            };
            for err in errors {
                let mut e = make_event("phpstan", ValidationEventType::LintIssue);
                e.category = "php_lint".to_string();
                e.ref_file = path.clone();
                e.ref_line = i32_field(err, "line");
                e.message = str_field(err, "message").to_string();
                e.set_outcome(ValidationEventStatus::Error, "error");
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(PhpstanJsonParser, "phpstan", "linting_tool", priority::VERY_HIGH);

/// ShellCheck `-f json`: array of `{file,line,column,level,code,message}`.
pub struct ShellcheckJsonParser;

impl ShellcheckJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"level\"") && content.contains("\"code\"") && content.contains("\"file\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| {
                let mut e = make_event("shellcheck", ValidationEventType::LintIssue);
                e.category = "shell_script".to_string();
                e.ref_file = str_field(item, "file").to_string();
                e.ref_line = i32_field(item, "line");
                e.ref_column = i32_field(item, "column");
                e.error_code = format!("SC{}", item.get("code").and_then(Value::as_i64).unwrap_or(0));
                e.message = str_field(item, "message").to_string();
                let (status, sev) = map_level_to_severity(str_field(item, "level"));
                e.set_outcome(status, sev);
                e
            })
            .collect()
    }
}
parser_meta!(ShellcheckJsonParser, "shellcheck", "linting_tool", priority::VERY_HIGH, commands: ["shellcheck%"]);

/// ktlint `--reporter=json`: array of `{file,errors:[{line,col,message,rule}]}`.
pub struct KtlintJsonParser;

impl KtlintJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"errors\"") && content.contains("\"rule\"") && content.contains("\"col\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(files)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for file in &files {
            let path = str_field(file, "file");
            let Some(Value::Array(errors)) = file.get("errors") else {
                continue;
            };
            for err in errors {
                let mut e = make_event("ktlint", ValidationEventType::LintIssue);
                e.category = "kotlin_lint".to_string();
                e.ref_file = path.to_string();
                e.ref_line = i32_field(err, "line");
                e.ref_column = i32_field(err, "col");
                e.error_code = str_field(err, "rule").to_string();
                e.message = str_field(err, "message").to_string();
                e.set_outcome(ValidationEventStatus::Warning, "warning");
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(KtlintJsonParser, "ktlint", "linting_tool", priority::VERY_HIGH);

/// kube-score `-o json`: array of `{object_name,checks:[{check_name,severity,message}]}`.
pub struct KubeScoreJsonParser;

impl KubeScoreJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"object_name\"") && content.contains("\"checks\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(Value::Array(objects)) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        for object in &objects {
            let name = str_field(object, "object_name");
            let Some(Value::Array(checks)) = object.get("checks") else {
                continue;
            };
            for check in checks {
                if check.get("grade").and_then(Value::as_i64).unwrap_or(10) >= 10 {
                    continue; // fully-graded checks carry no issue
                }
                let mut e = make_event("kube-score", ValidationEventType::LintIssue);
                e.category = "kubernetes_lint".to_string();
                e.ref_file = name.to_string();
                e.error_code = str_field(check, "check_name").to_string();
                e.message = str_field(check, "message").to_string();
                let (status, sev) = map_level_to_severity(str_field(check, "severity"));
                e.set_outcome(status, sev);
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(KubeScoreJsonParser, "kube-score", "linting_tool", priority::HIGH);

/// tfsec `--format json`: `{results:[{rule_id,severity,description,location:{filename,start_line}}]}`.
pub struct TfsecJsonParser;

impl TfsecJsonParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"rule_id\"") && content.contains("\"location\"") && content.contains("\"results\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let Ok(root) = serde_json::from_str::<Value>(content) else {
            return Vec::new();
        };
        let Some(Value::Array(results)) = root.get("results") else {
            return Vec::new();
        };
        results
            .iter()
            .map(|r| {
                let mut e = make_event("tfsec", ValidationEventType::SecurityFinding);
                e.category = "terraform_security".to_string();
                if let Some(loc) = r.get("location") {
                    e.ref_file = str_field(loc, "filename").to_string();
                    e.ref_line = i32_field(loc, "start_line");
                }
                e.error_code = str_field(r, "rule_id").to_string();
                e.message = str_field(r, "description").to_string();
                let (status, sev) = map_level_to_severity(str_field(r, "severity"));
                e.set_outcome(status, sev);
                e
            })
            .collect()
    }
}
parser_meta!(TfsecJsonParser, "tfsec", "security_tool", priority::VERY_HIGH);

pub fn register(registry: &mut ToolParserRegistry) {
    registry.register(Box::new(EslintJsonParser));
    registry.register(Box::new(RuffJsonParser));
    registry.register(Box::new(HadolintJsonParser));
    registry.register(Box::new(LintrJsonParser));
    registry.register(Box::new(SqlfluffJsonParser));
    registry.register(Box::new(TflintJsonParser));
    registry.register(Box::new(RubocopJsonParser));
    registry.register(Box::new(BanditJsonParser));
    registry.register(Box::new(SpotbugsJsonParser));
    registry.register(Box::new(TrivyJsonParser));
    registry.register(Box::new(StylelintJsonParser));
    registry.register(Box::new(MarkdownlintJsonParser));
    registry.register(Box::new(YamllintJsonParser));
    registry.register(Box::new(SwiftlintJsonParser));
    registry.register(Box::new(PhpstanJsonParser));
    registry.register(Box::new(ShellcheckJsonParser));
    registry.register(Box::new(KtlintJsonParser));
    registry.register(Box::new(KubeScoreJsonParser));
    registry.register(Box::new(TfsecJsonParser));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eslint_matches_spec_scenario_s1() {
        let content = r#"[{"filePath":"/a.js","messages":[{"ruleId":"no-unused-vars","severity":2,"message":"x is unused","line":3,"column":5}]}]"#;
        let parser = EslintJsonParser;
        assert!(parser.can_parse(content));
        let events = parser.parse(content);
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.tool_name, "eslint");
        assert_eq!(e.ref_file, "/a.js");
        assert_eq!(e.ref_line, 3);
        assert_eq!(e.ref_column, 5);
        assert_eq!(e.error_code, "no-unused-vars");
        assert_eq!(e.status, ValidationEventStatus::Error);
        assert_eq!(e.severity, "error");
        assert_eq!(e.message, "x is unused");
    }

    #[test]
    fn eslint_warning_severity_maps_to_warning() {
        let content = r#"[{"filePath":"/a.js","messages":[{"ruleId":"x","severity":1,"message":"m","line":1,"column":1}]}]"#;
        let events = EslintJsonParser.parse(content);
        assert_eq!(events[0].status, ValidationEventStatus::Warning);
        assert_eq!(events[0].severity, "warning");
    }

    #[test]
    fn eslint_tolerates_empty_messages() {
        let content = r#"[{"filePath":"/clean.js","messages":[]}]"#;
        assert!(EslintJsonParser.parse(content).is_empty());
    }

    #[test]
    fn malformed_json_does_not_panic() {
        assert!(EslintJsonParser.parse("not json at all").is_empty());
        assert!(BanditJsonParser.parse("{\"results\": \"oops\"}").is_empty());
    }

    #[test]
    fn bandit_security_finding() {
        let content = r#"{"results":[{"filename":"app.py","issue_severity":"HIGH","issue_text":"hardcoded password","line_number":10,"test_id":"B105"}]}"#;
        let events = BanditJsonParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type.as_str(), "SecurityFinding");
        assert_eq!(events[0].error_code, "B105");
    }
}
