//! Shared helpers every leaf parser calls into, instead of repeating the
//! same severity table and line-counting logic ~50 times (spec.md §9,
//! "Severity mapping consolidation" and "Line-position tracking").

use crate::model::{ValidationEventStatus, ValidationEventType};

/// Monotone id allocator, one per `parse()` call. Leaf parsers build one
/// locally; workflow parsers share a single allocator across the whole
/// job/step/delegated-event tree so ids stay strictly increasing end to
/// end (spec.md §8 invariant 1).
#[derive(Debug, Default)]
pub struct EventIdAllocator {
    next: i64,
}

impl EventIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Maps a freeform level token (`"ERROR"`, `"warn"`, `"FATAL"`, ...) to the
/// `(status, severity)` pair every leaf parser's outcome should carry.
/// This is the single table spec.md §9 asks to centralize: levels
/// containing critical/fatal/panic/emerg/alert/error/err map to `error`
/// (or `critical` for the first group); warn/warning maps to `warning`;
/// everything else is `info`, except explicit pass/ok/success and
/// skip/ignored tokens.
pub fn map_level_to_severity(raw: &str) -> (ValidationEventStatus, &'static str) {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("critical") || lower.contains("fatal") || lower.contains("panic")
        || lower.contains("emerg") || lower.contains("alert")
    {
        (ValidationEventStatus::Error, "critical")
    } else if lower.contains("error") || lower.contains("err") {
        (ValidationEventStatus::Error, "error")
    } else if lower.contains("warn") {
        (ValidationEventStatus::Warning, "warning")
    } else if lower.contains("pass") || lower.contains("ok") || lower.contains("success") {
        (ValidationEventStatus::Pass, "info")
    } else if lower.contains("skip") || lower.contains("ignored") {
        (ValidationEventStatus::Skip, "info")
    } else {
        (ValidationEventStatus::Info, "info")
    }
}

/// Iterates `(1-indexed line number, line)` pairs over `content`, so every
/// line-oriented parser counts lines the same way instead of drifting on
/// trailing-newline/CRLF handling.
pub fn numbered_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
}

/// Counts how many of the first `limit` non-blank lines match `is_match`,
/// returning `(matches, checked)`. Used by regex-over-lines parsers'
/// `can_parse`, per spec.md §4.4's "checked/3" detection rule.
pub fn count_matches_in_head<F: Fn(&str) -> bool>(content: &str, limit: usize, is_match: F) -> (usize, usize) {
    let mut matches = 0;
    let mut checked = 0;
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        checked += 1;
        if is_match(line) {
            matches += 1;
        }
        if checked >= limit {
            break;
        }
    }
    (matches, checked)
}

/// `can_parse` detection threshold shared by every regex-over-lines
/// parser: at least a third of the sampled head lines must match.
pub fn detects_by_head_sample<F: Fn(&str) -> bool>(content: &str, is_match: F) -> bool {
    let (matches, checked) = count_matches_in_head(content, 10, is_match);
    checked > 0 && matches * 3 >= checked
}

/// Builds the `event_type` + `category` pairing most linters share.
pub fn lint_issue(tool: &str, category: &str) -> crate::model::ValidationEvent {
    let mut e = crate::model::ValidationEvent::new(tool, ValidationEventType::LintIssue);
    e.category = category.to_string();
    e
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_is_monotone() {
        let mut a = EventIdAllocator::new();
        let ids: Vec<i64> = (0..5).map(|_| a.next_id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn severity_table_maps_known_tokens() {
        assert_eq!(map_level_to_severity("FATAL").1, "critical");
        assert_eq!(map_level_to_severity("ERROR").1, "error");
        assert_eq!(map_level_to_severity("WARN").1, "warning");
        assert_eq!(map_level_to_severity("INFO").1, "info");
        assert_eq!(map_level_to_severity("PASS").0, ValidationEventStatus::Pass);
    }

    #[test]
    fn head_sample_requires_third_match() {
        let content = "a\nMATCH\nb\nc\nd\ne\nf\ng\nh\ni";
        assert!(!detects_by_head_sample(content, |l| l == "MATCH"));
        let content2 = "MATCH\nMATCH\nMATCH\nMATCH\nb\nc\nd";
        assert!(detects_by_head_sample(content2, |l| l == "MATCH"));
    }
}
