use super::join::JoinNode;
use super::nodes::{FilterNode, ProjectNode, TableScanNode};

/// Pass over a plan tree, one method per node kind.
///
/// There are no fallbacks: adding a node kind breaks every visitor until it
/// handles the new kind. `C` is threaded through unchanged by
/// [`PlanNode::accept`](super::node::PlanNode::accept).
pub trait PlanVisitor<C> {
    type Output;

    fn visit_table_scan(&mut self, node: &TableScanNode, context: C) -> Self::Output;

    fn visit_filter(&mut self, node: &FilterNode, context: C) -> Self::Output;

    fn visit_project(&mut self, node: &ProjectNode, context: C) -> Self::Output;

    fn visit_join(&mut self, node: &JoinNode, context: C) -> Self::Output;
}
