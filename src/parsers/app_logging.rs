//! Application-logging parsers (spec.md §4.4's third leaf family): each
//! scans line by line with one precompiled regex instead of parsing a
//! structured root, and uses `common::detects_by_head_sample` for
//! `can_parse` the way `original_source`'s regex-based parsers sample
//! their input before committing.

use crate::common::{detects_by_head_sample, map_level_to_severity, numbered_lines};
use crate::model::{make_event, ValidationEvent, ValidationEventType};
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

/// log4j's default PatternLayout: `2024-01-02 03:04:05,678 ERROR [main] com.foo.Bar - message`.
static LOG4J_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ts>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}) (?P<level>[A-Z]+) \[(?P<thread>[^\]]+)\] (?P<logger>\S+) - (?P<msg>.*)$").unwrap()
});

pub struct Log4jParser;

impl Log4jParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| LOG4J_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = LOG4J_RE.captures(line) else { continue };
            let mut e = make_event("log4j", ValidationEventType::DebugEvent);
            e.category = "java_logging".to_string();
            e.function_name = caps["logger"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = caps["msg"].to_string();
            e.started_at = caps["ts"].to_string();
            let (status, sev) = map_level_to_severity(&caps["level"]);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(Log4jParser, "log4j", "application_log", priority::MEDIUM);

/// Python `logging` default format: `2024-01-02 03:04:05,678 - name - LEVEL - message`.
static PYTHON_LOGGING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ts>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}) - (?P<name>\S+) - (?P<level>[A-Z]+) - (?P<msg>.*)$").unwrap()
});

pub struct PythonLoggingParser;

impl PythonLoggingParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| PYTHON_LOGGING_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = PYTHON_LOGGING_RE.captures(line) else { continue };
            let mut e = make_event("python_logging", ValidationEventType::DebugEvent);
            e.category = "python_logging".to_string();
            e.function_name = caps["name"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = caps["msg"].to_string();
            e.started_at = caps["ts"].to_string();
            let (status, sev) = map_level_to_severity(&caps["level"]);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(PythonLoggingParser, "python_logging", "application_log", priority::MEDIUM);

/// Logrus text formatter: `time="2024-01-02T03:04:05Z" level=error msg="oops" key=value`.
static LOGRUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^time="(?P<ts>[^"]+)" level=(?P<level>\w+) msg="(?P<msg>[^"]*)""#).unwrap()
});

pub struct LogrusParser;

impl LogrusParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| LOGRUS_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = LOGRUS_RE.captures(line) else { continue };
            let mut e = make_event("logrus", ValidationEventType::DebugEvent);
            e.category = "go_logging".to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = caps["msg"].to_string();
            e.started_at = caps["ts"].to_string();
            let (status, sev) = map_level_to_severity(&caps["level"]);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(LogrusParser, "logrus", "application_log", priority::MEDIUM);

/// Winston's default `simple` format: `error: message {"meta":"data"}` or
/// with a timestamp combinator: `2024-01-02T03:04:05.678Z error: message`.
static WINSTON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(?P<ts>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z) )?(?P<level>\w+): (?P<msg>.*)$").unwrap());

pub struct WinstonParser;

impl WinstonParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| {
            WINSTON_RE.is_match(l) && matches!(
                WINSTON_RE.captures(l).map(|c| c["level"].to_ascii_lowercase()).as_deref(),
                Some("error" | "warn" | "info" | "debug" | "verbose" | "silly")
            )
        })
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = WINSTON_RE.captures(line) else { continue };
            let level = caps["level"].to_ascii_lowercase();
            if !matches!(level.as_str(), "error" | "warn" | "info" | "debug" | "verbose" | "silly") {
                continue;
            }
            let mut e = make_event("winston", ValidationEventType::DebugEvent);
            e.category = "node_logging".to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = caps["msg"].to_string();
            if let Some(m) = caps.name("ts") {
                e.started_at = m.as_str().to_string();
            }
            let (status, sev) = map_level_to_severity(&level);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(WinstonParser, "winston", "application_log", priority::LOW);

/// Pino's default JSON-lines output: `{"level":30,"time":1700000000000,"msg":"hi"}`.
/// Numeric levels follow Pino's scale (10 trace .. 60 fatal).
pub struct PinoParser;

impl PinoParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"level\"") && content.contains("\"time\"") && content.contains("\"msg\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        use serde_json::Value;
        let mut events = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(obj) = serde_json::from_str::<Value>(line) else { continue };
            let Some(level_num) = obj.get("level").and_then(Value::as_i64) else { continue };
            let level = match level_num {
                n if n >= 60 => "fatal",
                n if n >= 50 => "error",
                n if n >= 40 => "warn",
                n if n >= 30 => "info",
                n if n >= 20 => "debug",
                _ => "trace",
            };
            let mut e = make_event("pino", ValidationEventType::DebugEvent);
            e.category = "node_logging".to_string();
            e.log_content = line.to_string();
            e.message = obj.get("msg").and_then(Value::as_str).unwrap_or("").to_string();
            if let Some(t) = obj.get("time").and_then(Value::as_i64) {
                e.started_at = t.to_string();
            }
            let (status, sev) = map_level_to_severity(level);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(PinoParser, "pino", "application_log", priority::MEDIUM);

/// Bunyan's JSON-lines output: `{"name":"app","level":50,"msg":"oops","time":"2024-...Z"}`.
pub struct BunyanParser;

impl BunyanParser {
    fn detect(&self, content: &str) -> bool {
        content.contains("\"level\"") && content.contains("\"hostname\"") && content.contains("\"pid\"")
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        use serde_json::Value;
        let mut events = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(obj) = serde_json::from_str::<Value>(line) else { continue };
            let Some(level_num) = obj.get("level").and_then(Value::as_i64) else { continue };
            let level = match level_num {
                n if n >= 60 => "fatal",
                n if n >= 50 => "error",
                n if n >= 40 => "warn",
                n if n >= 30 => "info",
                n if n >= 20 => "debug",
                _ => "trace",
            };
            let mut e = make_event("bunyan", ValidationEventType::DebugEvent);
            e.category = "node_logging".to_string();
            e.function_name = obj.get("name").and_then(Value::as_str).unwrap_or("").to_string();
            e.log_content = line.to_string();
            e.message = obj.get("msg").and_then(Value::as_str).unwrap_or("").to_string();
            e.started_at = obj.get("time").and_then(Value::as_str).unwrap_or("").to_string();
            let (status, sev) = map_level_to_severity(level);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(BunyanParser, "bunyan", "application_log", priority::MEDIUM);

/// Serilog's compact console theme: `[03:04:05 ERR] message {Property}`.
static SERILOG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(?P<ts>\d{2}:\d{2}:\d{2}) (?P<level>\w{3})\] (?P<msg>.*)$").unwrap());

pub struct SerilogParser;

impl SerilogParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| SERILOG_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = SERILOG_RE.captures(line) else { continue };
            let level = match &caps["level"] {
                "VRB" => "trace",
                "DBG" => "debug",
                "INF" => "info",
                "WRN" => "warning",
                "ERR" => "error",
                "FTL" => "critical",
                other => other,
            };
            let mut e = make_event("serilog", ValidationEventType::DebugEvent);
            e.category = "dotnet_logging".to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = caps["msg"].to_string();
            e.started_at = caps["ts"].to_string();
            let (status, sev) = map_level_to_severity(level);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(SerilogParser, "serilog", "application_log", priority::MEDIUM);

/// NLog's default layout: `2024-01-02 03:04:05.6789 ERROR message`.
static NLOG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ts>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{4}) (?P<level>[A-Z]+) (?P<msg>.*)$").unwrap()
});

pub struct NlogParser;

impl NlogParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| NLOG_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = NLOG_RE.captures(line) else { continue };
            let mut e = make_event("nlog", ValidationEventType::DebugEvent);
            e.category = "dotnet_logging".to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = caps["msg"].to_string();
            e.started_at = caps["ts"].to_string();
            let (status, sev) = map_level_to_severity(&caps["level"]);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(NlogParser, "nlog", "application_log", priority::MEDIUM);

/// Ruby's stdlib `Logger` default format: `E, [2024-01-02T03:04:05.678901 #1234] ERROR -- app: message`.
static RUBY_LOGGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z], \[(?P<ts>[^ ]+) #\d+\] (?P<level>\w+) -- (?P<progname>[^:]*): (?P<msg>.*)$").unwrap()
});

pub struct RubyLoggerParser;

impl RubyLoggerParser {
    fn detect(&self, content: &str) -> bool {
        detects_by_head_sample(content, |l| RUBY_LOGGER_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (line_no, line) in numbered_lines(content) {
            let Some(caps) = RUBY_LOGGER_RE.captures(line) else { continue };
            let mut e = make_event("ruby_logger", ValidationEventType::DebugEvent);
            e.category = "ruby_logging".to_string();
            e.function_name = caps["progname"].to_string();
            e.log_line_start = line_no as i32;
            e.log_line_end = line_no as i32;
            e.log_content = line.to_string();
            e.message = caps["msg"].to_string();
            e.started_at = caps["ts"].to_string();
            let (status, sev) = map_level_to_severity(&caps["level"]);
            e.set_outcome(status, sev);
            events.push(e);
        }
        events
    }
}
parser_meta!(RubyLoggerParser, "ruby_logger", "application_log", priority::MEDIUM);

/// Rails' request log block: `Started GET "/path" for 127.0.0.1 at 2024-01-02 03:04:05 +0000`
/// paired with a later `Completed 200 OK in 12ms` line. Each `Started`/`Completed`
/// pair correlates into one event the way the test-runner parsers correlate
/// started/terminal records.
static RAILS_STARTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^Started (?P<verb>\w+) "(?P<path>[^"]+)".* at (?P<ts>.+)$"#).unwrap());
static RAILS_COMPLETED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Completed (?P<status>\d+) \w+(?: \w+)? in (?P<ms>\d+)ms").unwrap());

pub struct RailsLoggerParser;

impl RailsLoggerParser {
    fn detect(&self, content: &str) -> bool {
        content.lines().any(|l| RAILS_STARTED_RE.is_match(l))
    }

    fn parse_impl(&self, content: &str) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        let mut pending: Option<(usize, String, String, String)> = None;
        for (line_no, line) in numbered_lines(content) {
            if let Some(caps) = RAILS_STARTED_RE.captures(line) {
                pending = Some((line_no, caps["verb"].to_string(), caps["path"].to_string(), caps["ts"].to_string()));
                continue;
            }
            if let Some(caps) = RAILS_COMPLETED_RE.captures(line) {
                let Some((start_line, verb, path, ts)) = pending.take() else { continue };
                let status: u32 = caps["status"].parse().unwrap_or(0);
                let mut e = make_event("rails_logger", ValidationEventType::DebugEvent);
                e.category = "rails_request".to_string();
                e.target = path.clone();
                e.message = format!("{verb} {path} -> {status}");
                e.started_at = ts;
                e.log_line_start = start_line as i32;
                e.log_line_end = line_no as i32;
                e.execution_time = caps["ms"].parse::<f64>().unwrap_or(0.0) / 1000.0;
                if status >= 500 {
                    e.set_outcome(crate::model::ValidationEventStatus::Error, "error");
                } else if status >= 400 {
                    e.set_outcome(crate::model::ValidationEventStatus::Warning, "warning");
                } else {
                    e.set_outcome(crate::model::ValidationEventStatus::Pass, "");
                }
                events.push(e);
            }
        }
        events
    }
}
parser_meta!(RailsLoggerParser, "rails_logger", "application_log", priority::MEDIUM);

pub fn register(registry: &mut ToolParserRegistry) {
    registry.register(Box::new(Log4jParser));
    registry.register(Box::new(PythonLoggingParser));
    registry.register(Box::new(LogrusParser));
    registry.register(Box::new(PinoParser));
    registry.register(Box::new(BunyanParser));
    registry.register(Box::new(SerilogParser));
    registry.register(Box::new(NlogParser));
    registry.register(Box::new(RubyLoggerParser));
    registry.register(Box::new(RailsLoggerParser));
    registry.register(Box::new(WinstonParser));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationEventStatus;

    #[test]
    fn log4j_parses_level_and_logger() {
        let content = "2024-01-02 03:04:05,678 ERROR [main] com.foo.Bar - connection refused";
        assert!(Log4jParser.can_parse(content));
        let events = Log4jParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].function_name, "com.foo.Bar");
        assert_eq!(events[0].status, ValidationEventStatus::Error);
    }

    #[test]
    fn python_logging_parses_standard_format() {
        let content = "2024-01-02 03:04:05,678 - myapp.db - WARNING - pool exhausted";
        let events = PythonLoggingParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, "warning");
    }

    #[test]
    fn pino_numeric_level_maps_to_severity() {
        let content = r#"{"level":50,"time":1700000000000,"msg":"db down"}"#;
        let events = PinoParser.parse(content);
        assert_eq!(events[0].status, ValidationEventStatus::Error);
    }

    #[test]
    fn rails_logger_correlates_started_and_completed() {
        let content = "Started GET \"/users\" for 127.0.0.1 at 2024-01-02 03:04:05 +0000\nProcessing...\nCompleted 200 OK in 42ms\n";
        let events = RailsLoggerParser.parse(content);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target, "/users");
        assert_eq!(events[0].status, ValidationEventStatus::Pass);
    }

    #[test]
    fn rails_logger_server_error_status() {
        let content = "Started POST \"/x\" for ::1 at 2024-01-02 03:04:05 +0000\nCompleted 500 Internal Server Error in 3ms\n";
        let events = RailsLoggerParser.parse(content);
        assert_eq!(events[0].status, ValidationEventStatus::Error);
    }
}
