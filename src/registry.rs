//! C3/C5 — priority-ordered parser registries. Populated once at startup
//! (see `bootstrap`), read-only thereafter (spec.md §5).

use crate::parser::{CommandPattern, ToolParser};
use crate::workflow::WorkflowParser;

/// Ordered collection of tool-output parsers. Insertion order is preserved
/// as the tie-break within a priority band (spec.md §4.3).
pub struct ToolParserRegistry {
    parsers: Vec<Box<dyn ToolParser>>,
    sorted: bool,
}

impl ToolParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
            sorted: true,
        }
    }

    /// Registers a parser and immediately re-sorts by priority. Only called
    /// during `Registries::bootstrap`, so the O(n log n) re-sort per call is
    /// not a hot-path cost — and keeping the registry sorted eagerly lets
    /// every lookup method below take `&self`, which workflow delegation
    /// (spec.md §4.5) needs since `WorkflowParser::parse_workflow_log` only
    /// gets a shared reference to the tool registry.
    pub fn register(&mut self, parser: Box<dyn ToolParser>) {
        self.parsers.push(parser);
        self.sorted = false;
        self.ensure_sorted();
    }

    fn ensure_sorted(&mut self) {
        if !self.sorted {
            // `sort_by_key` is stable, so parsers registered earlier within
            // the same priority band keep winning ties.
            self.parsers
                .sort_by_key(|p| std::cmp::Reverse(p.priority()));
            self.sorted = true;
        }
    }

    /// Iterates parsers in priority-descending order, returning the first
    /// whose `can_parse` matches.
    pub fn find_parser(&self, content: &str) -> Option<&dyn ToolParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(content))
            .map(|p| p.as_ref())
    }

    pub fn get_parser(&self, format_name: &str) -> Option<&dyn ToolParser> {
        self.parsers
            .iter()
            .find(|p| p.format_name() == format_name || p.name() == format_name)
            .map(|p| p.as_ref())
    }

    /// Finds the highest-priority parser with a `CommandPattern` matching
    /// `command`, for workflow delegation (spec.md §4.5). Ties break by
    /// priority then registration order, same as `find_parser`.
    pub fn find_parser_by_command(&self, command: &str) -> Option<&dyn ToolParser> {
        self.parsers
            .iter()
            .find(|p| {
                p.command_patterns()
                    .iter()
                    .any(|pattern: &CommandPattern| pattern.matches(command))
            })
            .map(|p| p.as_ref())
    }

    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ToolParser> {
        self.parsers.iter().map(|p| p.as_ref())
    }
}

impl Default for ToolParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered collection of workflow-engine parsers; same shape as
/// `ToolParserRegistry` but over the distinct `WorkflowParser` contract.
pub struct WorkflowParserRegistry {
    parsers: Vec<Box<dyn WorkflowParser>>,
    sorted: bool,
}

impl WorkflowParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
            sorted: true,
        }
    }

    pub fn register(&mut self, parser: Box<dyn WorkflowParser>) {
        self.parsers.push(parser);
        self.sorted = false;
    }

    fn ensure_sorted(&mut self) {
        if !self.sorted {
            self.parsers
                .sort_by_key(|p| std::cmp::Reverse(p.priority()));
            self.sorted = true;
        }
    }

    pub fn find_parser(&mut self, content: &str) -> Option<&dyn WorkflowParser> {
        self.ensure_sorted();
        self.parsers
            .iter()
            .find(|p| p.can_parse(content))
            .map(|p| p.as_ref())
    }

    pub fn get_parser(&mut self, format_name: &str) -> Option<&dyn WorkflowParser> {
        self.ensure_sorted();
        self.parsers
            .iter()
            .find(|p| p.format_name() == format_name)
            .map(|p| p.as_ref())
    }

    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }
}

impl Default for WorkflowParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The two registries the rest of the crate dispatches through. Built
/// once by `register_all_parsers` and handed out by reference — the
/// "global registries without global initializers" design note in
/// spec.md §9 replacing ctor-time side effects with an explicit call.
pub struct Registries {
    pub tools: ToolParserRegistry,
    pub workflows: WorkflowParserRegistry,
}

impl Registries {
    pub fn bootstrap() -> Self {
        let mut tools = ToolParserRegistry::new();
        let mut workflows = WorkflowParserRegistry::new();
        crate::parsers::register_all(&mut tools);
        crate::workflow_parsers::register_all(&mut workflows);
        Self { tools, workflows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationEvent;

    struct Stub {
        name: &'static str,
        priority: i32,
    }

    impl ToolParser for Stub {
        fn can_parse(&self, content: &str) -> bool {
            content.contains(self.name)
        }
        fn parse(&self, _content: &str) -> Vec<ValidationEvent> {
            Vec::new()
        }
        fn format_name(&self) -> &'static str {
            self.name
        }
        fn name(&self) -> &'static str {
            self.name
        }
        fn category(&self) -> &'static str {
            "stub"
        }
        fn priority(&self) -> i32 {
            self.priority
        }
    }

    #[test]
    fn find_parser_prefers_highest_priority_on_tie_in_content() {
        let mut reg = ToolParserRegistry::new();
        reg.register(Box::new(Stub { name: "x", priority: 10 }));
        reg.register(Box::new(Stub { name: "x", priority: 50 }));
        let found = reg.find_parser("x present").unwrap();
        assert_eq!(found.priority(), 50);
    }

    #[test]
    fn registration_order_breaks_ties() {
        let mut reg = ToolParserRegistry::new();
        reg.register(Box::new(Stub { name: "a", priority: 30 }));
        reg.register(Box::new(Stub { name: "b", priority: 30 }));
        let names: Vec<&str> = reg.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
