// Non-join plan nodes
//
// Just enough operators to host joins in a real plan: a leaf scan, a filter
// and a projection. They follow the same rules as JoinNode: fields are
// private, construction validates, rewrites return new values.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::types::{PlanNodeId, SourceLocation};
use crate::expression::{RowExpression, VariableReference};

use super::error::{PlanError, PlanResult};
use super::node::{PlanNode, PlanNodeFields};

/// Fail unless every column `expression` reads is produced by `source`
fn check_resolved(node: &PlanNodeId, expression: &RowExpression, source: &PlanNode) -> PlanResult<()> {
    let available: HashSet<&VariableReference> = source.output_variables().iter().collect();
    match expression.variables().into_iter().find(|v| !available.contains(v)) {
        Some(variable) => Err(PlanError::UnresolvedVariable {
            node: node.to_string(),
            variable: variable.to_string(),
        }),
        None => Ok(()),
    }
}

/// Leaf reading columns from a connector table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TableScanNode {
    id: PlanNodeId,
    #[serde(default)]
    source_location: Option<SourceLocation>,
    table: String,
    output_variables: Vec<VariableReference>,
    #[serde(skip)]
    stats_equivalent_plan_node: Option<Arc<PlanNode>>,
}

impl TableScanNode {
    pub fn new(id: PlanNodeId, table: impl Into<String>, output_variables: Vec<VariableReference>) -> Self {
        Self {
            id,
            source_location: None,
            table: table.into(),
            output_variables,
            stats_equivalent_plan_node: None,
        }
    }

    pub fn id(&self) -> &PlanNodeId {
        &self.id
    }

    pub fn source_location(&self) -> Option<SourceLocation> {
        self.source_location
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn output_variables(&self) -> &[VariableReference] {
        &self.output_variables
    }

    pub fn stats_equivalent_plan_node(&self) -> Option<&Arc<PlanNode>> {
        self.stats_equivalent_plan_node.as_ref()
    }

    pub fn assign_stats_equivalent_plan_node(&self, node: Option<Arc<PlanNode>>) -> TableScanNode {
        TableScanNode {
            stats_equivalent_plan_node: node,
            ..self.clone()
        }
    }
}

/// Keeps the rows of `source` matching `predicate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FilterNodeFields", into = "FilterNodeFields")]
pub struct FilterNode {
    id: PlanNodeId,
    source_location: Option<SourceLocation>,
    source: Arc<PlanNode>,
    predicate: RowExpression,
    stats_equivalent_plan_node: Option<Arc<PlanNode>>,
}

impl FilterNode {
    pub fn new(id: PlanNodeId, source: Arc<PlanNode>, predicate: RowExpression) -> PlanResult<Self> {
        check_resolved(&id, &predicate, &source)?;
        Ok(Self {
            id,
            source_location: None,
            source,
            predicate,
            stats_equivalent_plan_node: None,
        })
    }

    pub fn with_source_location(mut self, source_location: SourceLocation) -> Self {
        self.source_location = Some(source_location);
        self
    }

    pub fn id(&self) -> &PlanNodeId {
        &self.id
    }

    pub fn source_location(&self) -> Option<SourceLocation> {
        self.source_location
    }

    pub fn source(&self) -> &Arc<PlanNode> {
        &self.source
    }

    pub fn predicate(&self) -> &RowExpression {
        &self.predicate
    }

    pub fn output_variables(&self) -> &[VariableReference] {
        self.source.output_variables()
    }

    pub fn stats_equivalent_plan_node(&self) -> Option<&Arc<PlanNode>> {
        self.stats_equivalent_plan_node.as_ref()
    }

    pub fn replace_children(&self, new_children: Vec<Arc<PlanNode>>) -> PlanResult<FilterNode> {
        let source = single_child(new_children)?;
        check_resolved(&self.id, &self.predicate, &source)?;
        Ok(FilterNode {
            source,
            ..self.clone()
        })
    }

    pub fn assign_stats_equivalent_plan_node(&self, node: Option<Arc<PlanNode>>) -> FilterNode {
        FilterNode {
            stats_equivalent_plan_node: node,
            ..self.clone()
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct FilterNodeFields {
    id: PlanNodeId,
    source_location: Option<SourceLocation>,
    source: Box<PlanNodeFields>,
    predicate: RowExpression,
}

impl TryFrom<FilterNodeFields> for FilterNode {
    type Error = PlanError;

    fn try_from(fields: FilterNodeFields) -> PlanResult<Self> {
        let node = FilterNode::new(fields.id, fields.source.into_child()?, fields.predicate)?;
        Ok(match fields.source_location {
            Some(source_location) => node.with_source_location(source_location),
            None => node,
        })
    }
}

impl From<FilterNode> for FilterNodeFields {
    fn from(node: FilterNode) -> Self {
        FilterNodeFields {
            id: node.id,
            source_location: node.source_location,
            source: PlanNodeFields::child(&node.source),
            predicate: node.predicate,
        }
    }
}

/// One output column of a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub output: VariableReference,
    pub expression: RowExpression,
}

impl Assignment {
    pub fn new(output: VariableReference, expression: RowExpression) -> Self {
        Self { output, expression }
    }

    /// Pass an input column through unchanged
    pub fn identity(variable: VariableReference) -> Self {
        Self::new(variable.clone(), RowExpression::Variable(variable))
    }
}

/// Computes a new set of columns from `source`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProjectNodeFields", into = "ProjectNodeFields")]
pub struct ProjectNode {
    id: PlanNodeId,
    source_location: Option<SourceLocation>,
    source: Arc<PlanNode>,
    assignments: Vec<Assignment>,
    output_variables: Vec<VariableReference>,
    stats_equivalent_plan_node: Option<Arc<PlanNode>>,
}

impl ProjectNode {
    pub fn new(id: PlanNodeId, source: Arc<PlanNode>, assignments: Vec<Assignment>) -> PlanResult<Self> {
        for assignment in &assignments {
            check_resolved(&id, &assignment.expression, &source)?;
        }
        let output_variables = assignments.iter().map(|a| a.output.clone()).collect();
        Ok(Self {
            id,
            source_location: None,
            source,
            assignments,
            output_variables,
            stats_equivalent_plan_node: None,
        })
    }

    pub fn with_source_location(mut self, source_location: SourceLocation) -> Self {
        self.source_location = Some(source_location);
        self
    }

    pub fn id(&self) -> &PlanNodeId {
        &self.id
    }

    pub fn source_location(&self) -> Option<SourceLocation> {
        self.source_location
    }

    pub fn source(&self) -> &Arc<PlanNode> {
        &self.source
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn output_variables(&self) -> &[VariableReference] {
        &self.output_variables
    }

    pub fn stats_equivalent_plan_node(&self) -> Option<&Arc<PlanNode>> {
        self.stats_equivalent_plan_node.as_ref()
    }

    pub fn replace_children(&self, new_children: Vec<Arc<PlanNode>>) -> PlanResult<ProjectNode> {
        let source = single_child(new_children)?;
        for assignment in &self.assignments {
            check_resolved(&self.id, &assignment.expression, &source)?;
        }
        Ok(ProjectNode {
            source,
            ..self.clone()
        })
    }

    pub fn assign_stats_equivalent_plan_node(&self, node: Option<Arc<PlanNode>>) -> ProjectNode {
        ProjectNode {
            stats_equivalent_plan_node: node,
            ..self.clone()
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ProjectNodeFields {
    id: PlanNodeId,
    source_location: Option<SourceLocation>,
    source: Box<PlanNodeFields>,
    assignments: Vec<Assignment>,
}

impl TryFrom<ProjectNodeFields> for ProjectNode {
    type Error = PlanError;

    fn try_from(fields: ProjectNodeFields) -> PlanResult<Self> {
        let node = ProjectNode::new(fields.id, fields.source.into_child()?, fields.assignments)?;
        Ok(match fields.source_location {
            Some(source_location) => node.with_source_location(source_location),
            None => node,
        })
    }
}

impl From<ProjectNode> for ProjectNodeFields {
    fn from(node: ProjectNode) -> Self {
        ProjectNodeFields {
            id: node.id,
            source_location: node.source_location,
            source: PlanNodeFields::child(&node.source),
            assignments: node.assignments,
        }
    }
}

fn single_child(new_children: Vec<Arc<PlanNode>>) -> PlanResult<Arc<PlanNode>> {
    let [child]: [Arc<PlanNode>; 1] = new_children.try_into().map_err(
        |children: Vec<Arc<PlanNode>>| PlanError::ChildArityMismatch {
            expected: 1,
            actual: children.len(),
        },
    )?;
    Ok(child)
}
