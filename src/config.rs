//! The bind-time record spec.md §6 describes: everything the table
//! function's caller supplies, besides `source` and `format` themselves.

use crate::model::SeverityLevel;

#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub severity_threshold: SeverityLevel,
    /// When true, the boundary adapter converts a structural parse
    /// failure into an empty result instead of raising.
    pub ignore_errors: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            severity_threshold: SeverityLevel::Debug,
            ignore_errors: false,
        }
    }
}

/// The formats a caller may pass explicitly, for error messages and CLI
/// help text (spec.md §6).
pub const LEGAL_WORKFLOW_FORMATS: &[&str] = &[
    "auto",
    "github_actions",
    "gitlab_ci",
    "jenkins",
    "docker_build",
    "drone",
    "spack",
    "github_actions_zip",
];
