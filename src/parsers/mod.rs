//! C4 — leaf (tool-output) parsers, grouped by dialect family the way
//! `original_source/src/parsers/*` lays them out.

pub mod app_logging;
pub mod ci_text;
pub mod cloud_audit;
pub mod infra_security;
pub mod linting;
pub mod test_frameworks;

use crate::registry::ToolParserRegistry;

/// Registers every bundled tool-output parser. Called once from
/// `Registries::bootstrap`.
pub fn register_all(registry: &mut ToolParserRegistry) {
    linting::register(registry);
    test_frameworks::register(registry);
    app_logging::register(registry);
    infra_security::register(registry);
    cloud_audit::register(registry);
    ci_text::register(registry);
}
