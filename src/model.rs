//! The unified validation-event record (C1).
//!
//! `ValidationEvent` is the single wide row shape every parser in this
//! crate projects into. Fields that a given dialect does not populate keep
//! their sentinel default (empty string, `-1`, `0.0`) rather than becoming
//! absent — the fixed-width schema is what lets the boundary layer (§4.8)
//! project a uniform column set regardless of which of the ~60 source
//! dialects produced the row.

use serde::{Deserialize, Serialize};

/// Tagged variant describing what kind of thing a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationEventType {
    BuildError,
    TestResult,
    LintIssue,
    SecurityFinding,
    PerformanceMetric,
    PerformanceIssue,
    DebugInfo,
    DebugEvent,
    Summary,
}

impl ValidationEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuildError => "BuildError",
            Self::TestResult => "TestResult",
            Self::LintIssue => "LintIssue",
            Self::SecurityFinding => "SecurityFinding",
            Self::PerformanceMetric => "PerformanceMetric",
            Self::PerformanceIssue => "PerformanceIssue",
            Self::DebugInfo => "DebugInfo",
            Self::DebugEvent => "DebugEvent",
            Self::Summary => "Summary",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "BuildError" => Self::BuildError,
            "TestResult" => Self::TestResult,
            "LintIssue" => Self::LintIssue,
            "SecurityFinding" => Self::SecurityFinding,
            "PerformanceMetric" => Self::PerformanceMetric,
            "PerformanceIssue" => Self::PerformanceIssue,
            "DebugInfo" => Self::DebugInfo,
            "DebugEvent" => Self::DebugEvent,
            "Summary" => Self::Summary,
            _ => return None,
        })
    }
}

impl std::fmt::Display for ValidationEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse pass/fail classification, kept consistent with `severity` per
/// the rule in spec.md invariant 5: `Error` <-> `{error, critical}`,
/// `Warning` <-> `warning`, `Pass` <-> `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationEventStatus {
    Pass,
    Fail,
    Error,
    Warning,
    Info,
    Skip,
}

impl ValidationEventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
            Self::Skip => "Skip",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "Pass" => Self::Pass,
            "Fail" => Self::Fail,
            "Error" => Self::Error,
            "Warning" => Self::Warning,
            "Info" => Self::Info,
            "Skip" => Self::Skip,
            _ => return None,
        })
    }
}

impl std::fmt::Display for ValidationEventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total ordering over severity, used by the post-parse threshold filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

impl SeverityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Maps a freeform severity string to a level. Unknown/tool-specific
    /// strings (spec.md §3 allows these to flow through `severity` itself)
    /// are treated as `Info` for threshold purposes only.
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Self::Debug,
            "warning" | "warn" => Self::Warning,
            "error" | "err" => Self::Error,
            "critical" | "fatal" | "panic" | "emerg" | "alert" => Self::Critical,
            _ => Self::Info,
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "critical" => Self::Critical,
            _ => return None,
        })
    }
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when `severity` (a freeform string, possibly tool-specific)
/// meets or exceeds `threshold`. Unrecognized severities are treated as
/// `Info` so they pass any threshold at or below `Info` and are dropped by
/// stricter thresholds — the same behavior a `Warning` threshold needs to
/// keep from silently admitting noise.
pub fn severity_passes_threshold(severity: &str, threshold: SeverityLevel) -> bool {
    SeverityLevel::from_str_loose(severity) >= threshold
}

/// Recognized CI/CD transcript dialects handled by the workflow registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowLogFormat {
    Auto,
    GithubActions,
    GitlabCi,
    Jenkins,
    DockerBuild,
    Drone,
    Spack,
    GithubActionsZip,
    Unknown,
}

impl WorkflowLogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::GithubActions => "github_actions",
            Self::GitlabCi => "gitlab_ci",
            Self::Jenkins => "jenkins",
            Self::DockerBuild => "docker_build",
            Self::Drone => "drone",
            Self::Spack => "spack",
            Self::GithubActionsZip => "github_actions_zip",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "auto" => Self::Auto,
            "github_actions" => Self::GithubActions,
            "gitlab_ci" => Self::GitlabCi,
            "jenkins" => Self::Jenkins,
            "docker_build" => Self::DockerBuild,
            "drone" => Self::Drone,
            "spack" => Self::Spack,
            "github_actions_zip" => Self::GithubActionsZip,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for WorkflowLogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified validation-event row. See spec.md §3 for the field-by-field
/// rationale; field order here matches the §6 44-column output order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationEvent {
    pub event_id: i64,
    pub tool_name: String,
    pub event_type: ValidationEventType,
    pub ref_file: String,
    pub ref_line: i32,
    pub ref_column: i32,
    pub function_name: String,
    pub status: ValidationEventStatus,
    pub severity: String,
    pub category: String,
    pub error_code: String,
    pub message: String,
    pub suggestion: String,
    pub log_content: String,
    pub structured_data: String,
    pub log_line_start: i32,
    pub log_line_end: i32,
    pub test_name: String,
    pub execution_time: f64,
    pub principal: String,
    pub origin: String,
    pub target: String,
    pub actor_type: String,
    pub started_at: String,
    pub external_id: String,
    pub scope: String,
    pub scope_id: String,
    pub scope_status: String,
    pub group: String,
    pub group_id: String,
    pub group_status: String,
    pub unit: String,
    pub unit_id: String,
    pub unit_status: String,
    pub subunit: String,
    pub subunit_id: String,
    pub fingerprint: String,
    pub similarity_score: f64,
    pub pattern_id: i64,
    pub workflow_type: String,
    pub hierarchy_level: i32,
    pub parent_id: String,
    pub job_order: i32,
    pub job_name: String,
}

impl ValidationEvent {
    /// Builds an event with every sentinel default applied. `event_id` is
    /// left at `0`; callers assign the monotone id before returning the
    /// event from `parse()` (see `common::EventIdAllocator`).
    pub fn new(tool_name: &str, event_type: ValidationEventType) -> Self {
        Self {
            event_id: 0,
            tool_name: tool_name.to_string(),
            event_type,
            ref_file: String::new(),
            ref_line: -1,
            ref_column: -1,
            function_name: String::new(),
            status: ValidationEventStatus::Info,
            severity: "info".to_string(),
            category: String::new(),
            error_code: String::new(),
            message: String::new(),
            suggestion: String::new(),
            log_content: String::new(),
            structured_data: String::new(),
            log_line_start: -1,
            log_line_end: -1,
            test_name: String::new(),
            execution_time: 0.0,
            principal: String::new(),
            origin: String::new(),
            target: String::new(),
            actor_type: String::new(),
            started_at: String::new(),
            external_id: String::new(),
            scope: String::new(),
            scope_id: String::new(),
            scope_status: String::new(),
            group: String::new(),
            group_id: String::new(),
            group_status: String::new(),
            unit: String::new(),
            unit_id: String::new(),
            unit_status: String::new(),
            subunit: String::new(),
            subunit_id: String::new(),
            fingerprint: String::new(),
            similarity_score: 0.0,
            pattern_id: -1,
            workflow_type: String::new(),
            hierarchy_level: 0,
            parent_id: String::new(),
            job_order: -1,
            job_name: String::new(),
        }
    }

    /// Applies the status/severity agreement rule from spec.md §3's
    /// invariants. Leaf parsers call this once they know the outcome
    /// instead of setting `status`/`severity` independently and risking
    /// drift (the source's bug the rewrite fixes per §9).
    pub fn set_outcome(&mut self, status: ValidationEventStatus, severity_hint: &str) {
        self.status = status;
        self.severity = match status {
            ValidationEventStatus::Error => {
                if severity_hint == "critical" {
                    "critical".to_string()
                } else {
                    "error".to_string()
                }
            }
            ValidationEventStatus::Warning => "warning".to_string(),
            ValidationEventStatus::Pass => "info".to_string(),
            _ => {
                if severity_hint.is_empty() {
                    "info".to_string()
                } else {
                    severity_hint.to_string()
                }
            }
        };
    }
}

/// Convenience constructor mirroring the original `make_event` free
/// function so leaf parsers read `make_event("eslint", LintIssue)` the way
/// spec.md §4.1 names it.
pub fn make_event(tool_name: &str, event_type: ValidationEventType) -> ValidationEvent {
    ValidationEvent::new(tool_name, event_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips() {
        for t in [
            ValidationEventType::BuildError,
            ValidationEventType::TestResult,
            ValidationEventType::LintIssue,
            ValidationEventType::SecurityFinding,
            ValidationEventType::PerformanceMetric,
            ValidationEventType::PerformanceIssue,
            ValidationEventType::DebugInfo,
            ValidationEventType::DebugEvent,
            ValidationEventType::Summary,
        ] {
            assert_eq!(ValidationEventType::from_str_opt(t.as_str()), Some(t));
        }
        assert_eq!(ValidationEventType::from_str_opt("nonsense"), None);
    }

    #[test]
    fn status_round_trips() {
        for s in [
            ValidationEventStatus::Pass,
            ValidationEventStatus::Fail,
            ValidationEventStatus::Error,
            ValidationEventStatus::Warning,
            ValidationEventStatus::Info,
            ValidationEventStatus::Skip,
        ] {
            assert_eq!(ValidationEventStatus::from_str_opt(s.as_str()), Some(s));
        }
    }

    #[test]
    fn severity_threshold_ordering() {
        assert!(severity_passes_threshold("warning", SeverityLevel::Info));
        assert!(severity_passes_threshold("warning", SeverityLevel::Warning));
        assert!(!severity_passes_threshold("warning", SeverityLevel::Error));
        assert!(severity_passes_threshold("critical", SeverityLevel::Error));
    }

    #[test]
    fn new_event_has_sentinel_defaults() {
        let e = make_event("eslint", ValidationEventType::LintIssue);
        assert_eq!(e.ref_line, -1);
        assert_eq!(e.ref_column, -1);
        assert_eq!(e.log_line_start, -1);
        assert_eq!(e.pattern_id, -1);
        assert_eq!(e.job_order, -1);
        assert_eq!(e.execution_time, 0.0);
    }

    #[test]
    fn set_outcome_enforces_status_severity_agreement() {
        let mut e = make_event("x", ValidationEventType::LintIssue);
        e.set_outcome(ValidationEventStatus::Warning, "whatever");
        assert_eq!(e.severity, "warning");
        e.set_outcome(ValidationEventStatus::Error, "critical");
        assert_eq!(e.severity, "critical");
        e.set_outcome(ValidationEventStatus::Pass, "ignored");
        assert_eq!(e.severity, "info");
    }
}
