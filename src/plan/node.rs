// Plan Tree
//
// The closed set of plan node kinds and the protocol every plan node
// follows: ids, output columns, children, rewrites and visitor dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::types::{PlanNodeId, SourceLocation};
use crate::expression::VariableReference;

use super::error::{PlanError, PlanResult};
use super::join::{JoinNode, JoinNodeFields};
use super::nodes::{FilterNode, FilterNodeFields, ProjectNode, ProjectNodeFields, TableScanNode};
use super::properties::LogicalPropertiesProvider;
use super::visitor::PlanVisitor;

/// A node in the query plan. Children are shared, never deep-copied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlanNodeFields", into = "PlanNodeFields")]
pub enum PlanNode {
    TableScan(TableScanNode),
    Filter(FilterNode),
    Project(ProjectNode),
    Join(JoinNode),
}

impl PlanNode {
    pub fn id(&self) -> &PlanNodeId {
        match self {
            PlanNode::TableScan(node) => node.id(),
            PlanNode::Filter(node) => node.id(),
            PlanNode::Project(node) => node.id(),
            PlanNode::Join(node) => node.id(),
        }
    }

    pub fn source_location(&self) -> Option<SourceLocation> {
        match self {
            PlanNode::TableScan(node) => node.source_location(),
            PlanNode::Filter(node) => node.source_location(),
            PlanNode::Project(node) => node.source_location(),
            PlanNode::Join(node) => node.source_location(),
        }
    }

    /// Columns visible to the parent, in order
    pub fn output_variables(&self) -> &[VariableReference] {
        match self {
            PlanNode::TableScan(node) => node.output_variables(),
            PlanNode::Filter(node) => node.output_variables(),
            PlanNode::Project(node) => node.output_variables(),
            PlanNode::Join(node) => node.output_variables(),
        }
    }

    pub fn sources(&self) -> Vec<Arc<PlanNode>> {
        match self {
            PlanNode::TableScan(_) => Vec::new(),
            PlanNode::Filter(node) => vec![Arc::clone(node.source())],
            PlanNode::Project(node) => vec![Arc::clone(node.source())],
            PlanNode::Join(node) => node.sources(),
        }
    }

    /// Same node over new children, re-validated
    pub fn replace_children(&self, new_children: Vec<Arc<PlanNode>>) -> PlanResult<PlanNode> {
        match self {
            PlanNode::TableScan(_) => {
                if new_children.is_empty() {
                    Ok(self.clone())
                } else {
                    Err(PlanError::ChildArityMismatch {
                        expected: 0,
                        actual: new_children.len(),
                    })
                }
            }
            PlanNode::Filter(node) => node.replace_children(new_children).map(PlanNode::Filter),
            PlanNode::Project(node) => node.replace_children(new_children).map(PlanNode::Project),
            PlanNode::Join(node) => node.replace_children(new_children).map(PlanNode::Join),
        }
    }

    pub fn stats_equivalent_plan_node(&self) -> Option<&Arc<PlanNode>> {
        match self {
            PlanNode::TableScan(node) => node.stats_equivalent_plan_node(),
            PlanNode::Filter(node) => node.stats_equivalent_plan_node(),
            PlanNode::Project(node) => node.stats_equivalent_plan_node(),
            PlanNode::Join(node) => node.stats_equivalent_plan_node(),
        }
    }

    pub fn assign_stats_equivalent_plan_node(&self, node: Option<Arc<PlanNode>>) -> PlanNode {
        match self {
            PlanNode::TableScan(n) => PlanNode::TableScan(n.assign_stats_equivalent_plan_node(node)),
            PlanNode::Filter(n) => PlanNode::Filter(n.assign_stats_equivalent_plan_node(node)),
            PlanNode::Project(n) => PlanNode::Project(n.assign_stats_equivalent_plan_node(node)),
            PlanNode::Join(n) => PlanNode::Join(n.assign_stats_equivalent_plan_node(node)),
        }
    }

    /// Dispatch to the visitor method for this node's kind
    pub fn accept<V, C>(&self, visitor: &mut V, context: C) -> V::Output
    where
        V: PlanVisitor<C> + ?Sized,
    {
        match self {
            PlanNode::TableScan(node) => visitor.visit_table_scan(node, context),
            PlanNode::Filter(node) => visitor.visit_filter(node, context),
            PlanNode::Project(node) => visitor.visit_project(node, context),
            PlanNode::Join(node) => node.accept(visitor, context),
        }
    }

    pub fn compute_logical_properties<P>(&self, provider: &P) -> P::Properties
    where
        P: LogicalPropertiesProvider + ?Sized,
    {
        match self {
            PlanNode::TableScan(node) => provider.table_scan_properties(node),
            PlanNode::Filter(node) => provider.filter_properties(node),
            PlanNode::Project(node) => provider.project_properties(node),
            PlanNode::Join(node) => node.compute_logical_properties(provider),
        }
    }

    pub fn as_join(&self) -> Option<&JoinNode> {
        match self {
            PlanNode::Join(node) => Some(node),
            _ => None,
        }
    }
}

impl From<TableScanNode> for PlanNode {
    fn from(node: TableScanNode) -> Self {
        PlanNode::TableScan(node)
    }
}

impl From<FilterNode> for PlanNode {
    fn from(node: FilterNode) -> Self {
        PlanNode::Filter(node)
    }
}

impl From<ProjectNode> for PlanNode {
    fn from(node: ProjectNode) -> Self {
        PlanNode::Project(node)
    }
}

impl From<JoinNode> for PlanNode {
    fn from(node: JoinNode) -> Self {
        PlanNode::Join(node)
    }
}

/// Serialized shape of a plan tree. Nothing here is validated yet; turning
/// it into a [`PlanNode`] runs every node's constructor, bottom-up, and
/// reports the first failure as its own [`PlanError`] variant.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum PlanNodeFields {
    TableScan(TableScanNode),
    Filter(FilterNodeFields),
    Project(ProjectNodeFields),
    Join(JoinNodeFields),
}

impl PlanNodeFields {
    pub(crate) fn child(node: &Arc<PlanNode>) -> Box<PlanNodeFields> {
        Box::new(PlanNodeFields::from(node.as_ref().clone()))
    }

    pub(crate) fn into_child(self: Box<Self>) -> PlanResult<Arc<PlanNode>> {
        PlanNode::try_from(*self).map(Arc::new)
    }
}

impl TryFrom<PlanNodeFields> for PlanNode {
    type Error = PlanError;

    fn try_from(fields: PlanNodeFields) -> PlanResult<Self> {
        match fields {
            PlanNodeFields::TableScan(node) => Ok(PlanNode::TableScan(node)),
            PlanNodeFields::Filter(fields) => FilterNode::try_from(fields).map(PlanNode::Filter),
            PlanNodeFields::Project(fields) => ProjectNode::try_from(fields).map(PlanNode::Project),
            PlanNodeFields::Join(fields) => JoinNode::try_from(fields).map(PlanNode::Join),
        }
    }
}

impl From<PlanNode> for PlanNodeFields {
    fn from(node: PlanNode) -> Self {
        match node {
            PlanNode::TableScan(node) => PlanNodeFields::TableScan(node),
            PlanNode::Filter(node) => PlanNodeFields::Filter(node.into()),
            PlanNode::Project(node) => PlanNodeFields::Project(node.into()),
            PlanNode::Join(node) => PlanNodeFields::Join(node.into()),
        }
    }
}
