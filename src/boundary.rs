//! C8 — boundary adapters: resolving `source` to content, and projecting
//! a `ValidationEvent` to the 44-column output row spec.md §6 defines.
//! The SQL engine/table-function binding and the ZIP virtual filesystem
//! themselves stay external collaborators; this module only goes as far
//! as "read the bytes" and "shape the row".

use crate::error::{HarvestError, Result};
use crate::model::ValidationEvent;
use serde::Serialize;
use std::path::Path;

/// Resolves `source` to its string content.
///
/// - An existing file path is read whole (spec.md: "inputs are read
///   whole", no streaming).
/// - A virtual URI (`zip://`, `s3://`, `http://`) is deferred to the
///   host's filesystem abstraction, which this crate does not implement —
///   callers needing those schemes must resolve them before calling in.
/// - Anything else is treated as literal content.
pub fn resolve_source(source: &str) -> Result<String> {
    if let Some(scheme_end) = source.find("://") {
        let scheme = &source[..scheme_end];
        if matches!(scheme, "zip" | "s3" | "http" | "https") {
            return Err(HarvestError::Io {
                source_id: source.to_string(),
                message: format!(
                    "virtual URI scheme '{scheme}' requires a host filesystem abstraction, which is out of scope for this crate"
                ),
            });
        }
    }

    let path = Path::new(source);
    if path.is_file() {
        return std::fs::read_to_string(path).map_err(|e| HarvestError::io(source, e));
    }

    Ok(source.to_string())
}

/// Reads raw bytes for sources that need archive handling (GitHub Actions
/// ZIP downloads) rather than UTF-8 text.
pub fn resolve_source_bytes(source: &str) -> Result<Vec<u8>> {
    let path = Path::new(source);
    if path.is_file() {
        return std::fs::read(path).map_err(|e| HarvestError::io(source, e));
    }
    Err(HarvestError::io(
        source,
        "expected an on-disk archive path for github_actions_zip",
    ))
}

/// Column-by-column sentinel-to-null projection of one event, matching
/// spec.md §6's 44-column table exactly. This is the shape a SQL binder
/// would materialize into its output chunk; here it backs the CLI's JSON
/// output and serves as the documented contract for that binder.
#[derive(Debug, Serialize)]
pub struct OutputRow {
    pub event_id: i64,
    pub tool_name: String,
    pub event_type: String,
    pub ref_file: Option<String>,
    pub ref_line: Option<i32>,
    pub ref_column: Option<i32>,
    pub function_name: Option<String>,
    pub status: String,
    pub severity: String,
    pub category: Option<String>,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub suggestion: Option<String>,
    pub log_content: Option<String>,
    pub structured_data: Option<String>,
    pub log_line_start: Option<i32>,
    pub log_line_end: Option<i32>,
    pub test_name: Option<String>,
    pub execution_time: f64,
    pub principal: Option<String>,
    pub origin: Option<String>,
    pub target: Option<String>,
    pub actor_type: Option<String>,
    pub started_at: Option<String>,
    pub external_id: Option<String>,
    pub scope: Option<String>,
    pub scope_id: Option<String>,
    pub scope_status: Option<String>,
    pub group: Option<String>,
    pub group_id: Option<String>,
    pub group_status: Option<String>,
    pub unit: Option<String>,
    pub unit_id: Option<String>,
    pub unit_status: Option<String>,
    pub subunit: Option<String>,
    pub subunit_id: Option<String>,
    pub fingerprint: Option<String>,
    pub similarity_score: Option<f64>,
    pub pattern_id: Option<i64>,
    pub workflow_type: Option<String>,
    pub hierarchy_level: i32,
    pub parent_id: Option<String>,
    pub job_order: Option<i32>,
    pub job_name: Option<String>,
}

fn null_if_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn null_if_neg(i: i32) -> Option<i32> {
    if i < 0 {
        None
    } else {
        Some(i)
    }
}

impl ValidationEvent {
    pub fn to_output_row(&self) -> OutputRow {
        OutputRow {
            event_id: self.event_id,
            tool_name: self.tool_name.clone(),
            event_type: self.event_type.as_str().to_string(),
            ref_file: null_if_empty(&self.ref_file),
            ref_line: null_if_neg(self.ref_line),
            ref_column: null_if_neg(self.ref_column),
            function_name: null_if_empty(&self.function_name),
            status: self.status.as_str().to_string(),
            severity: self.severity.clone(),
            category: null_if_empty(&self.category),
            error_code: null_if_empty(&self.error_code),
            message: null_if_empty(&self.message),
            suggestion: null_if_empty(&self.suggestion),
            log_content: null_if_empty(&self.log_content),
            structured_data: null_if_empty(&self.structured_data),
            log_line_start: null_if_neg(self.log_line_start),
            log_line_end: null_if_neg(self.log_line_end),
            test_name: null_if_empty(&self.test_name),
            execution_time: self.execution_time,
            principal: null_if_empty(&self.principal),
            origin: null_if_empty(&self.origin),
            target: null_if_empty(&self.target),
            actor_type: null_if_empty(&self.actor_type),
            started_at: null_if_empty(&self.started_at),
            external_id: null_if_empty(&self.external_id),
            scope: null_if_empty(&self.scope),
            scope_id: null_if_empty(&self.scope_id),
            scope_status: null_if_empty(&self.scope_status),
            group: null_if_empty(&self.group),
            group_id: null_if_empty(&self.group_id),
            group_status: null_if_empty(&self.group_status),
            unit: null_if_empty(&self.unit),
            unit_id: null_if_empty(&self.unit_id),
            unit_status: null_if_empty(&self.unit_status),
            subunit: null_if_empty(&self.subunit),
            subunit_id: null_if_empty(&self.subunit_id),
            fingerprint: null_if_empty(&self.fingerprint),
            similarity_score: if self.similarity_score == 0.0 {
                None
            } else {
                Some(self.similarity_score)
            },
            pattern_id: if self.pattern_id < 0 {
                None
            } else {
                Some(self.pattern_id)
            },
            workflow_type: null_if_empty(&self.workflow_type),
            hierarchy_level: self.hierarchy_level,
            parent_id: null_if_empty(&self.parent_id),
            job_order: null_if_neg(self.job_order),
            job_name: null_if_empty(&self.job_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationEventType;

    #[test]
    fn projection_nulls_sentinels() {
        let e = ValidationEvent::new("x", ValidationEventType::DebugEvent);
        let row = e.to_output_row();
        assert!(row.ref_file.is_none());
        assert!(row.ref_line.is_none());
        assert!(row.pattern_id.is_none());
        assert_eq!(row.execution_time, 0.0);
    }

    #[test]
    fn resolve_source_treats_non_path_as_literal_content() {
        let content = resolve_source("{\"not\":\"a path\"}").unwrap();
        assert_eq!(content, "{\"not\":\"a path\"}");
    }

    #[test]
    fn resolve_source_rejects_virtual_uris() {
        assert!(resolve_source("s3://bucket/key").is_err());
    }
}
