//! C2 — the tool-output parser contract and the command-pattern matcher
//! workflow delegation (§4.5) uses to pick a leaf parser for a step.

use crate::model::ValidationEvent;

/// Priority bands from spec.md §4.2, kept as named constants so individual
/// parsers pick a band instead of a magic number.
pub mod priority {
    pub const VERY_HIGH: i32 = 150;
    pub const HIGH: i32 = 80;
    pub const MEDIUM: i32 = 50;
    pub const LOW: i32 = 20;
}

/// Placeholder for host context a parser may need (e.g. to call back into
/// the SQL engine for an external reader). No bundled parser requires it
/// today; `requires_context`/`parse_with_context` exist so an out-of-tree
/// parser can opt in without changing the trait.
#[derive(Debug, Default)]
pub struct ParseContext;

/// A literal or SQL-LIKE command pattern a workflow step's command string
/// is matched against to select a delegated tool parser.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    Literal(String),
    /// `%` is a wildcard matching any run of characters, same semantics as
    /// SQL `LIKE`.
    Like(String),
}

impl CommandPattern {
    pub fn matches(&self, command: &str) -> bool {
        match self {
            CommandPattern::Literal(s) => s == command,
            CommandPattern::Like(pattern) => like_match(pattern, command),
        }
    }
}

/// Minimal SQL-LIKE matcher supporting only `%` (spec.md does not ask for
/// `_` single-char wildcards in command patterns, so it is not modeled).
fn like_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('%').collect();
    if parts.len() == 1 {
        return pattern == text;
    }
    let mut rest = text;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !rest.starts_with(part) {
                return false;
            }
            rest = &rest[part.len()..];
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Contract every tool-output parser implements (spec.md §4.2).
pub trait ToolParser: Send + Sync {
    /// Fast heuristic: cheap substring scans or a tiny regex. False
    /// positives are resolved by priority order or by `parse` simply
    /// returning nothing useful; false negatives cause the format to be
    /// missed entirely, so err toward permissive.
    fn can_parse(&self, content: &str) -> bool;

    /// Full parse. Must not panic on malformed input — partial/corrupt
    /// records are skipped, not raised (spec.md §4.4's failure policy).
    fn parse(&self, content: &str) -> Vec<ValidationEvent>;

    /// Hook for parsers needing host context. Default just calls `parse`.
    fn parse_with_context(&self, _ctx: &ParseContext, content: &str) -> Vec<ValidationEvent> {
        self.parse(content)
    }

    fn requires_context(&self) -> bool {
        false
    }

    fn format_name(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn category(&self) -> &'static str;
    fn priority(&self) -> i32;

    /// Literal/wildcard command strings that select this parser during
    /// workflow delegation (spec.md §4.5). Most parsers have none.
    fn command_patterns(&self) -> Vec<CommandPattern> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_match_handles_leading_trailing_and_middle_wildcards() {
        let p = CommandPattern::Like("eslint%--format=json%".to_string());
        assert!(p.matches("eslint --format=json src/"));
        assert!(!p.matches("ruff --format=json src/"));

        let p2 = CommandPattern::Like("%pytest%".to_string());
        assert!(p2.matches("python -m pytest tests/"));

        let p3 = CommandPattern::Literal("cargo test".to_string());
        assert!(p3.matches("cargo test"));
        assert!(!p3.matches("cargo test --release"));
    }
}
