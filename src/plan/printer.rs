// Plan Printer
//
// Renders a plan tree as indented text, one node per line, for EXPLAIN
// style output and debugging.

use std::fmt::{self, Write};

use crate::common::types::PlanNodeId;

use super::error::join_display;
use super::join::JoinNode;
use super::node::PlanNode;
use super::nodes::{FilterNode, ProjectNode, TableScanNode};
use super::visitor::PlanVisitor;

/// Controls how much detail the printer emits
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    /// Spaces per nesting level
    pub indent_width: usize,
    /// Print `[id]` after each node name
    pub show_ids: bool,
    /// Print join hash variables
    pub show_hash_variables: bool,
    /// Print join dynamic filters
    pub show_dynamic_filters: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            show_ids: true,
            show_hash_variables: true,
            show_dynamic_filters: true,
        }
    }
}

/// Visitor accumulating the text of a plan; the context is the depth
pub struct PlanPrinter {
    config: PrinterConfig,
    output: String,
}

impl PlanPrinter {
    pub fn new(config: PrinterConfig) -> Self {
        Self {
            config,
            output: String::new(),
        }
    }

    /// Render `plan` with the given configuration
    pub fn print(plan: &PlanNode, config: PrinterConfig) -> String {
        let mut printer = PlanPrinter::new(config);
        plan.accept(&mut printer, 0);
        printer.output
    }

    fn line(&mut self, depth: usize, text: fmt::Arguments<'_>) {
        let indent = depth * self.config.indent_width;
        writeln!(self.output, "{:indent$}{}", "", text, indent = indent).ok();
    }

    fn name(&self, name: &str, id: &PlanNodeId) -> String {
        if self.config.show_ids {
            format!("{}[{}]", name, id)
        } else {
            name.to_string()
        }
    }
}

impl PlanVisitor<usize> for PlanPrinter {
    type Output = ();

    fn visit_table_scan(&mut self, node: &TableScanNode, depth: usize) {
        let name = self.name("TableScan", node.id());
        self.line(
            depth,
            format_args!("{} {} => [{}]", name, node.table(), join_display(node.output_variables())),
        );
    }

    fn visit_filter(&mut self, node: &FilterNode, depth: usize) {
        let name = self.name("Filter", node.id());
        self.line(depth, format_args!("{} {}", name, node.predicate()));
        node.source().accept(self, depth + 1);
    }

    fn visit_project(&mut self, node: &ProjectNode, depth: usize) {
        let name = self.name("Project", node.id());
        let assignments = node
            .assignments()
            .iter()
            .map(|a| format!("{} := {}", a.output, a.expression))
            .collect::<Vec<_>>()
            .join(", ");
        self.line(depth, format_args!("{} [{}]", name, assignments));
        node.source().accept(self, depth + 1);
    }

    fn visit_join(&mut self, node: &JoinNode, depth: usize) {
        let mut header = format!("{} [{}]", self.name(node.join_type().label(), node.id()), join_display(node.criteria()));
        if let Some(filter) = node.filter() {
            header.push_str(&format!(" filter: {}", filter));
        }
        if let Some(distribution_type) = node.distribution_type() {
            header.push_str(&format!(" distribution: {}", distribution_type));
        }
        self.line(depth, format_args!("{}", header));

        let detail = depth + 1;
        self.line(detail, format_args!("outputs: [{}]", join_display(node.output_variables())));
        if self.config.show_hash_variables
            && (node.left_hash_variable().is_some() || node.right_hash_variable().is_some())
        {
            let left = node.left_hash_variable().map(|v| v.to_string()).unwrap_or_default();
            let right = node.right_hash_variable().map(|v| v.to_string()).unwrap_or_default();
            self.line(detail, format_args!("hash: [{}] [{}]", left, right));
        }
        if self.config.show_dynamic_filters && !node.dynamic_filters().is_empty() {
            let filters = node
                .dynamic_filters()
                .iter()
                .map(|(id, variable)| format!("{} -> {}", id, variable))
                .collect::<Vec<_>>()
                .join(", ");
            self.line(detail, format_args!("dynamic filters: {{{}}}", filters));
        }

        node.left().accept(self, detail);
        node.right().accept(self, detail);
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&PlanPrinter::print(self, PrinterConfig::default()))
    }
}
