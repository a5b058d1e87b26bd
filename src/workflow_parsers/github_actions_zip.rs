//! GitHub Actions run-log ZIP fan-out (spec.md §8 scenario S6). A
//! downloaded run archive has one numbered text file per job
//! (`1_build.txt`, `2_test.txt`, ...); each is parsed with
//! `GithubActionsParser::parse_job` and stamped with `job_order`/`job_name`
//! derived from the entry name, the same bookkeeping a SQL table
//! function's archive reader would do before handing rows to the engine.

use crate::model::ValidationEvent;
use crate::registry::ToolParserRegistry;
use crate::workflow_parsers::github_actions::GithubActionsParser;
use std::io::Read;
use zip::ZipArchive;

/// Splits a ZIP entry name like `3_integration-tests.txt` into
/// `(order, job_name)`. Entries without a leading numeric prefix get order
/// `-1` and keep their stem as the job name verbatim.
fn split_entry_name(entry_name: &str) -> (i32, String) {
    let stem = entry_name.rsplit('/').next().unwrap_or(entry_name);
    let stem = stem.strip_suffix(".txt").unwrap_or(stem);
    match stem.split_once('_') {
        Some((order_str, name)) if order_str.chars().all(|c| c.is_ascii_digit()) && !order_str.is_empty() => {
            (order_str.parse().unwrap_or(-1), name.replace('-', " "))
        }
        _ => (-1, stem.replace('-', " ")),
    }
}

/// Parses a GitHub Actions run-log ZIP archive (already read into memory by
/// the boundary layer's `resolve_source_bytes`) into the flat event vector
/// every other format produces, with `job_order`/`job_name` populated per
/// entry.
pub fn parse_zip(
    bytes: &[u8],
    source_id: &str,
    registry: &mut ToolParserRegistry,
) -> Result<Vec<ValidationEvent>, String> {
    let reader = std::io::Cursor::new(bytes);
    let mut archive = ZipArchive::new(reader).map_err(|e| format!("{source_id}: {e}"))?;
    let parser = GithubActionsParser;
    let mut events = Vec::new();

    let mut entry_names: Vec<String> = Vec::new();
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| format!("{source_id}: entry {i}: {e}"))?;
        let entry_name = entry.name().to_string();
        if entry.is_dir() || !entry_name.ends_with(".txt") || entry_name.contains('/') {
            continue;
        }
        entry_names.push(entry_name);
    }
    entry_names.sort();

    for entry_name in entry_names {
        let mut entry = archive
            .by_name(&entry_name)
            .map_err(|e| format!("{source_id}: entry {entry_name}: {e}"))?;
        let (order, job_name) = split_entry_name(&entry_name);
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| format!("{source_id}: entry {entry_name}: {e}"))?;
        let trace = format!("{source_id}:{entry_name}");
        for mut event in parser.parse_job(&content, &job_name, order, registry) {
            event.structured_data = trace.clone();
            events.push(event);
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_numbered_entry_names() {
        assert_eq!(split_entry_name("1_build.txt"), (1, "build".to_string()));
        assert_eq!(split_entry_name("12_integration-tests.txt"), (12, "integration tests".to_string()));
        assert_eq!(split_entry_name("setup.txt"), (-1, "setup".to_string()));
    }

    #[test]
    fn skips_txt_entries_nested_in_subdirectories() {
        use std::io::Write;
        use zip::write::{SimpleFileOptions, ZipWriter};

        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            zip.start_file("0_build.txt", options).unwrap();
            zip.write_all(b"##[group]Build\nok\n##[endgroup]\n").unwrap();
            zip.start_file("logs/0_build/metadata.txt", options).unwrap();
            zip.write_all(b"not a job log").unwrap();
            zip.finish().unwrap();
        }

        let mut regs = crate::registry::Registries::bootstrap();
        let events = parse_zip(&buf.into_inner(), "run.zip", &mut regs.tools).unwrap();
        assert!(!events.is_empty());
        assert!(events.iter().all(|e| e.job_name == "build"));
        assert!(events.iter().all(|e| e.structured_data == "run.zip:0_build.txt"));
    }
}
