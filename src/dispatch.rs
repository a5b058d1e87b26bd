//! C6 — format detection and dispatch. Ties the boundary layer, both
//! registries, and the severity filter together into the single entry
//! point `read_events` (spec.md §2's data-flow paragraph).

use crate::boundary::{resolve_source, resolve_source_bytes};
use crate::config::{ReadOptions, LEGAL_WORKFLOW_FORMATS};
use crate::error::{HarvestError, Result};
use crate::model::ValidationEvent;
use crate::registry::Registries;
use crate::severity::filter_and_renumber;
use crate::workflow_parsers::github_actions_zip;

/// Workflow discriminators checked, in order, before falling back to the
/// tool registry's `find_parser` (spec.md §4.6). Each entry is `(format
/// name, substring/regex probe)`; the first hit wins.
fn detect_workflow_format(content: &str) -> Option<&'static str> {
    if content.contains("##[group]") || content.contains("##[endgroup]") {
        return Some("github_actions");
    }
    if content.contains("Running with gitlab-runner") || content.contains("section_start:") {
        return Some("gitlab_ci");
    }
    if content.contains("Started by") || content.contains("Finished: SUCCESS") || content.contains("Finished: FAILURE") {
        return Some("jenkins");
    }
    if (content.contains("Step ") && content.contains('/') && content.contains(" : "))
        || content.contains("FROM ") && content.lines().any(|l| l.trim_start().starts_with("RUN ") || l.trim_start().starts_with("COPY "))
    {
        return Some("docker_build");
    }
    if content.contains("==> ") && content.contains("Executing phase:") {
        return Some("spack");
    }
    if content.lines().any(|l| l.starts_with("+ ")) && content.contains("exit code") {
        return Some("drone");
    }
    None
}

/// Main dispatch entry point, mirroring the "read"/"parse" table function
/// variants of spec.md §6: resolves `source`, selects a parser (explicit
/// or auto), parses, applies the severity filter, and returns the row
/// vector.
pub fn read_events(
    registries: &mut Registries,
    source: &str,
    format: &str,
    opts: &ReadOptions,
) -> Result<Vec<ValidationEvent>> {
    if format == "github_actions_zip" {
        let bytes = resolve_source_bytes(source)?;
        let events = github_actions_zip::parse_zip(&bytes, source, &mut registries.tools)
            .map_err(|e| HarvestError::Zip(e.to_string()))?;
        return Ok(filter_and_renumber(events, opts.severity_threshold));
    }

    let content = resolve_source(source)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let events = if format == "auto" {
        dispatch_auto(registries, source, &content, opts)?
    } else {
        dispatch_explicit(registries, source, format, &content, opts)?
    };

    Ok(filter_and_renumber(events, opts.severity_threshold))
}

fn dispatch_explicit(
    registries: &mut Registries,
    source: &str,
    format: &str,
    content: &str,
    opts: &ReadOptions,
) -> Result<Vec<ValidationEvent>> {
    if LEGAL_WORKFLOW_FORMATS.contains(&format) && format != "auto" {
        let parser = registries
            .workflows
            .get_parser(format)
            .ok_or_else(|| HarvestError::UnknownFormat {
                requested: format.to_string(),
                legal: legal_formats_message(registries),
            })?;
        return Ok(parser.parse_workflow_log(content, &registries.tools));
    }

    if let Some(parser) = registries.tools.get_parser(format) {
        return run_tool_parser(parser.format_name(), content, registries, opts, source);
    }

    Err(HarvestError::UnknownFormat {
        requested: format.to_string(),
        legal: legal_formats_message(registries),
    })
}

fn dispatch_auto(
    registries: &mut Registries,
    source: &str,
    content: &str,
    opts: &ReadOptions,
) -> Result<Vec<ValidationEvent>> {
    if let Some(workflow_format) = detect_workflow_format(content) {
        if let Some(parser) = registries.workflows.get_parser(workflow_format) {
            return Ok(parser.parse_workflow_log(content, &registries.tools));
        }
    }

    match registries.tools.find_parser(content) {
        Some(parser) => run_tool_parser(parser.format_name(), content, registries, opts, source),
        None => Ok(Vec::new()),
    }
}

/// Runs the named tool parser, converting a structural failure into
/// either a `HarvestError::Structural` (the default) or an empty result
/// (`ignore_errors=true`), per spec.md §7. Leaf parsers in this crate
/// never raise for per-record failures — only for an unrecoverable root
/// shape after committing to the format, which surfaces here as an empty
/// result from a parser whose `can_parse`/dispatch already matched — so
/// this only ever sees that one failure class.
fn run_tool_parser(
    format_name: &str,
    content: &str,
    registries: &mut Registries,
    opts: &ReadOptions,
    source: &str,
) -> Result<Vec<ValidationEvent>> {
    let parser = registries.tools.get_parser(format_name).expect("resolved above");
    let events = parser.parse(content);
    if events.is_empty() && !content.trim().is_empty() {
        if opts.ignore_errors {
            tracing::debug!(format = format_name, source, "parser produced no events, ignoring");
            return Ok(Vec::new());
        }
        return Err(HarvestError::Structural {
            source_id: source.to_string(),
            format: format_name.to_string(),
            message: "parser matched the format but produced no events".to_string(),
        });
    }
    Ok(events)
}

fn legal_formats_message(registries: &mut Registries) -> String {
    let mut names: Vec<String> = LEGAL_WORKFLOW_FORMATS.iter().map(|s| s.to_string()).collect();
    names.extend(registries.tools.iter().map(|p| p.format_name().to_string()));
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_returns_empty() {
        let mut regs = Registries::bootstrap();
        let events = read_events(&mut regs, "   \n  ", "auto", &ReadOptions::default()).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn unknown_explicit_format_errors() {
        let mut regs = Registries::bootstrap();
        let err = read_events(&mut regs, "content", "nosuchformat", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, HarvestError::UnknownFormat { .. }));
    }

    #[test]
    fn github_actions_text_auto_detected_over_embedded_json() {
        let mut regs = Registries::bootstrap();
        let content = "##[group]Setup\n[{\"filePath\":\"/a.js\",\"messages\":[]}]\n##[endgroup]\n";
        let events = read_events(&mut regs, content, "auto", &ReadOptions::default()).unwrap();
        assert!(events.iter().all(|e| e.workflow_type == "github_actions"));
    }
}
