//! C5 — hierarchical CI/CD workflow-engine parsers, grouped one file per
//! dialect the way `original_source/src/workflow_engines/*` does. Each
//! reconstructs scope/group/unit/subunit nesting instead of the flat event
//! list `parsers::ci_text` produces for the same tool's non-hierarchical
//! transcripts (see SPEC_FULL.md §3's dual-parser supplement).

pub mod docker_build;
pub mod drone;
pub mod github_actions;
pub mod github_actions_zip;
pub mod gitlab_ci;
pub mod jenkins;
pub mod spack;

use crate::registry::WorkflowParserRegistry;

/// Registers every bundled workflow parser. `github_actions_zip` is not a
/// `WorkflowParser` itself — its archive fan-out is invoked directly by
/// `dispatch::read_events` before the registry is consulted — so it has no
/// entry here.
pub fn register_all(registry: &mut WorkflowParserRegistry) {
    registry.register(Box::new(github_actions::GithubActionsParser));
    registry.register(Box::new(gitlab_ci::GitlabCiParser));
    registry.register(Box::new(jenkins::JenkinsParser));
    registry.register(Box::new(docker_build::DockerBuildParser));
    registry.register(Box::new(drone::DroneParser));
    registry.register(Box::new(spack::SpackParser));
}
