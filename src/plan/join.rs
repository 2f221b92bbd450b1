// Join Plan Node
//
// Binary join between two sub-plans. A JoinNode can only be obtained through
// JoinNodeBuilder::build, which checks every structural rule below; all
// rewrites go back through the builder, so a JoinNode in hand is always
// well formed.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use linked_hash_map::LinkedHashMap;
use log::{debug, trace};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::common::types::{PlanNodeId, SourceLocation};
use crate::expression::{RowExpression, VariableReference};

use super::equi_join::EquiJoinClause;
use super::error::{PlanError, PlanResult, join_display};
use super::join_type::{JoinDistributionType, JoinType};
use super::node::{PlanNode, PlanNodeFields};
use super::properties::LogicalPropertiesProvider;
use super::visitor::PlanVisitor;

/// Dynamic filter id to the build-side column feeding it
pub type DynamicFilters = LinkedHashMap<String, VariableReference>;

/// Set a dynamic filter. A filter id seen before keeps its position.
fn put_dynamic_filter(filters: &mut DynamicFilters, filter_id: String, variable: VariableReference) {
    match filters.get_mut(&filter_id) {
        Some(existing) => *existing = variable,
        None => {
            filters.insert(filter_id, variable);
        }
    }
}

/// Join between a probe side (`left`) and a build side (`right`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JoinNodeFields", into = "JoinNodeFields")]
pub struct JoinNode {
    id: PlanNodeId,
    source_location: Option<SourceLocation>,
    join_type: JoinType,
    left: Arc<PlanNode>,
    right: Arc<PlanNode>,
    criteria: Vec<EquiJoinClause>,
    output_variables: Vec<VariableReference>,
    filter: Option<RowExpression>,
    left_hash_variable: Option<VariableReference>,
    right_hash_variable: Option<VariableReference>,
    distribution_type: Option<JoinDistributionType>,
    dynamic_filters: DynamicFilters,
    stats_equivalent_plan_node: Option<Arc<PlanNode>>,
}

impl JoinNode {
    /// Start building a join. Everything not given here defaults to empty.
    pub fn builder(
        id: PlanNodeId,
        join_type: JoinType,
        left: Arc<PlanNode>,
        right: Arc<PlanNode>,
    ) -> JoinNodeBuilder {
        JoinNodeBuilder {
            id,
            source_location: None,
            join_type,
            left,
            right,
            criteria: Vec::new(),
            output_variables: Vec::new(),
            filter: None,
            left_hash_variable: None,
            right_hash_variable: None,
            distribution_type: None,
            dynamic_filters: DynamicFilters::new(),
            stats_equivalent_plan_node: None,
        }
    }

    /// Builder pre-filled with this node's fields, for copy-with-change rewrites
    pub fn to_builder(&self) -> JoinNodeBuilder {
        JoinNodeBuilder {
            id: self.id.clone(),
            source_location: self.source_location,
            join_type: self.join_type,
            left: Arc::clone(&self.left),
            right: Arc::clone(&self.right),
            criteria: self.criteria.clone(),
            output_variables: self.output_variables.clone(),
            filter: self.filter.clone(),
            left_hash_variable: self.left_hash_variable.clone(),
            right_hash_variable: self.right_hash_variable.clone(),
            distribution_type: self.distribution_type,
            dynamic_filters: self.dynamic_filters.clone(),
            stats_equivalent_plan_node: self.stats_equivalent_plan_node.clone(),
        }
    }

    pub fn id(&self) -> &PlanNodeId {
        &self.id
    }

    pub fn source_location(&self) -> Option<SourceLocation> {
        self.source_location
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn left(&self) -> &Arc<PlanNode> {
        &self.left
    }

    pub fn right(&self) -> &Arc<PlanNode> {
        &self.right
    }

    /// Streamed side of the hash join
    pub fn probe(&self) -> &Arc<PlanNode> {
        &self.left
    }

    /// Hashed side of the hash join
    pub fn build(&self) -> &Arc<PlanNode> {
        &self.right
    }

    pub fn criteria(&self) -> &[EquiJoinClause] {
        &self.criteria
    }

    pub fn output_variables(&self) -> &[VariableReference] {
        &self.output_variables
    }

    pub fn filter(&self) -> Option<&RowExpression> {
        self.filter.as_ref()
    }

    pub fn left_hash_variable(&self) -> Option<&VariableReference> {
        self.left_hash_variable.as_ref()
    }

    pub fn right_hash_variable(&self) -> Option<&VariableReference> {
        self.right_hash_variable.as_ref()
    }

    pub fn distribution_type(&self) -> Option<JoinDistributionType> {
        self.distribution_type
    }

    pub fn dynamic_filters(&self) -> &DynamicFilters {
        &self.dynamic_filters
    }

    pub fn stats_equivalent_plan_node(&self) -> Option<&Arc<PlanNode>> {
        self.stats_equivalent_plan_node.as_ref()
    }

    /// `[left, right]`, always in that order
    pub fn sources(&self) -> Vec<Arc<PlanNode>> {
        vec![Arc::clone(&self.left), Arc::clone(&self.right)]
    }

    pub fn is_cross_join(&self) -> bool {
        is_cross_join(self.join_type, &self.criteria, self.filter.as_ref())
    }

    /// Swap the two inputs.
    ///
    /// Outputs are regrouped so the new left side still comes first, and
    /// dynamic filters are dropped: they point at the old build side.
    pub fn flip_children(&self) -> PlanResult<JoinNode> {
        let new_left_variables: HashSet<&VariableReference> =
            self.right.output_variables().iter().collect();
        let (mut output_variables, former_left): (Vec<_>, Vec<_>) = self
            .output_variables
            .iter()
            .cloned()
            .partition(|variable| new_left_variables.contains(variable));
        output_variables.extend(former_left);

        let flipped = self
            .to_builder()
            .join_type(self.join_type.flip())
            .left(Arc::clone(&self.right))
            .right(Arc::clone(&self.left))
            .criteria(self.criteria.iter().map(EquiJoinClause::flip).collect())
            .output_variables(output_variables)
            .left_hash_variable(self.right_hash_variable.clone())
            .right_hash_variable(self.left_hash_variable.clone())
            .dynamic_filters(DynamicFilters::new())
            .build()?;
        trace!("Flipped join {} to {}", self.id, flipped.join_type);
        Ok(flipped)
    }

    /// Same join over new inputs; exactly two children are expected
    pub fn replace_children(&self, new_children: Vec<Arc<PlanNode>>) -> PlanResult<JoinNode> {
        let [left, right]: [Arc<PlanNode>; 2] = new_children.try_into().map_err(
            |children: Vec<Arc<PlanNode>>| PlanError::ChildArityMismatch {
                expected: 2,
                actual: children.len(),
            },
        )?;
        self.to_builder().left(left).right(right).build()
    }

    pub fn with_distribution_type(&self, distribution_type: JoinDistributionType) -> PlanResult<JoinNode> {
        self.to_builder()
            .distribution_type(Some(distribution_type))
            .build()
    }

    /// Attach the node the statistics layer should treat this one as
    /// equivalent to. None of the join rules depend on it.
    pub fn assign_stats_equivalent_plan_node(&self, node: Option<Arc<PlanNode>>) -> JoinNode {
        JoinNode {
            stats_equivalent_plan_node: node,
            ..self.clone()
        }
    }

    pub fn accept<V, C>(&self, visitor: &mut V, context: C) -> V::Output
    where
        V: PlanVisitor<C> + ?Sized,
    {
        visitor.visit_join(self, context)
    }

    pub fn compute_logical_properties<P>(&self, provider: &P) -> P::Properties
    where
        P: LogicalPropertiesProvider + ?Sized,
    {
        provider.join_properties(self)
    }
}

fn is_cross_join(join_type: JoinType, criteria: &[EquiJoinClause], filter: Option<&RowExpression>) -> bool {
    criteria.is_empty() && filter.is_none() && join_type == JoinType::Inner
}

/// Fails if any output variable drawn from `left_variables` sits after one
/// that is not.
pub fn check_left_output_variables_before_right(
    left_variables: &[VariableReference],
    output_variables: &[VariableReference],
) -> PlanResult<()> {
    let left_set: HashSet<&VariableReference> = left_variables.iter().collect();
    let mut left_max_position = None;
    let mut right_min_position = None;
    for (i, variable) in output_variables.iter().enumerate() {
        if left_set.contains(variable) {
            left_max_position = Some(i);
        } else if right_min_position.is_none() {
            right_min_position = Some(i);
        }
    }

    match (left_max_position, right_min_position) {
        (Some(left_max), Some(right_min)) if right_min < left_max => {
            Err(PlanError::OutputOrderingViolation {
                outputs: join_display(output_variables),
            })
        }
        _ => Ok(()),
    }
}

/// The only way to create a [`JoinNode`]
#[derive(Debug, Clone)]
pub struct JoinNodeBuilder {
    id: PlanNodeId,
    source_location: Option<SourceLocation>,
    join_type: JoinType,
    left: Arc<PlanNode>,
    right: Arc<PlanNode>,
    criteria: Vec<EquiJoinClause>,
    output_variables: Vec<VariableReference>,
    filter: Option<RowExpression>,
    left_hash_variable: Option<VariableReference>,
    right_hash_variable: Option<VariableReference>,
    distribution_type: Option<JoinDistributionType>,
    dynamic_filters: DynamicFilters,
    stats_equivalent_plan_node: Option<Arc<PlanNode>>,
}

impl JoinNodeBuilder {
    pub fn source_location(mut self, source_location: Option<SourceLocation>) -> Self {
        self.source_location = source_location;
        self
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    pub fn left(mut self, left: Arc<PlanNode>) -> Self {
        self.left = left;
        self
    }

    pub fn right(mut self, right: Arc<PlanNode>) -> Self {
        self.right = right;
        self
    }

    pub fn criteria(mut self, criteria: Vec<EquiJoinClause>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn output_variables(mut self, output_variables: Vec<VariableReference>) -> Self {
        self.output_variables = output_variables;
        self
    }

    pub fn filter(mut self, filter: Option<RowExpression>) -> Self {
        self.filter = filter;
        self
    }

    pub fn left_hash_variable(mut self, variable: Option<VariableReference>) -> Self {
        self.left_hash_variable = variable;
        self
    }

    pub fn right_hash_variable(mut self, variable: Option<VariableReference>) -> Self {
        self.right_hash_variable = variable;
        self
    }

    pub fn distribution_type(mut self, distribution_type: Option<JoinDistributionType>) -> Self {
        self.distribution_type = distribution_type;
        self
    }

    pub fn dynamic_filters(mut self, dynamic_filters: DynamicFilters) -> Self {
        self.dynamic_filters = dynamic_filters;
        self
    }

    /// Add one dynamic filter, keeping insertion order
    pub fn dynamic_filter(mut self, filter_id: impl Into<String>, variable: VariableReference) -> Self {
        put_dynamic_filter(&mut self.dynamic_filters, filter_id.into(), variable);
        self
    }

    pub fn stats_equivalent_plan_node(mut self, node: Option<Arc<PlanNode>>) -> Self {
        self.stats_equivalent_plan_node = node;
        self
    }

    pub fn build(self) -> PlanResult<JoinNode> {
        if let Err(e) = self.validate() {
            debug!("Rejected join node {}: {}", self.id, e);
            return Err(e);
        }

        Ok(JoinNode {
            id: self.id,
            source_location: self.source_location,
            join_type: self.join_type,
            left: self.left,
            right: self.right,
            criteria: self.criteria,
            output_variables: self.output_variables,
            filter: self.filter,
            left_hash_variable: self.left_hash_variable,
            right_hash_variable: self.right_hash_variable,
            distribution_type: self.distribution_type,
            dynamic_filters: self.dynamic_filters,
            stats_equivalent_plan_node: self.stats_equivalent_plan_node,
        })
    }

    fn validate(&self) -> PlanResult<()> {
        let left_variables = self.left.output_variables();
        let right_variables = self.right.output_variables();

        let input_variables: HashSet<&VariableReference> =
            left_variables.iter().chain(right_variables.iter()).collect();
        let missing: Vec<&VariableReference> = self
            .output_variables
            .iter()
            .filter(|variable| !input_variables.contains(variable))
            .collect();
        if !missing.is_empty() {
            return Err(PlanError::OutputNotContainedInInputs {
                missing: join_display(missing),
            });
        }

        if is_cross_join(self.join_type, &self.criteria, self.filter.as_ref()) {
            let distinct_outputs: HashSet<&VariableReference> = self.output_variables.iter().collect();
            if distinct_outputs.len() != self.output_variables.len()
                || self.output_variables.len() != input_variables.len()
            {
                return Err(PlanError::InvalidCrossJoinProjection {
                    outputs: join_display(&self.output_variables),
                    inputs: join_display(left_variables.iter().chain(right_variables.iter())),
                });
            }
        }

        if self.criteria.is_empty() {
            let hash_variables = [("Left", &self.left_hash_variable), ("Right", &self.right_hash_variable)];
            for (side, variable) in hash_variables {
                if let Some(variable) = variable {
                    return Err(PlanError::InvalidHashVariableWithoutCriteria {
                        side,
                        variable: variable.to_string(),
                    });
                }
            }
        }

        if let Some(distribution_type) = self.distribution_type {
            let reason = match distribution_type {
                JoinDistributionType::Replicated if self.join_type.must_partition() => {
                    Some(", it requires hash partitioned inputs")
                }
                JoinDistributionType::Partitioned if self.join_type.must_replicate(&self.criteria) => {
                    Some(", equi criteria are empty so there is nothing to partition on")
                }
                _ => None,
            };
            if let Some(reason) = reason {
                return Err(PlanError::IncompatibleDistributionType {
                    join_type: self.join_type.to_string(),
                    distribution_type: distribution_type.to_string(),
                    reason,
                });
            }
        }

        for (filter_id, variable) in self.dynamic_filters.iter() {
            if !right_variables.contains(variable) {
                return Err(PlanError::InvalidDynamicFilterTarget {
                    filter_id: filter_id.clone(),
                    variable: variable.to_string(),
                    right_variables: join_display(right_variables),
                });
            }
        }

        check_left_output_variables_before_right(left_variables, &self.output_variables)
    }
}

/// Property bag a join is serialized as. Decoding goes through
/// [`JoinNodeBuilder::build`], so a malformed bag never becomes a node.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct JoinNodeFields {
    id: Option<PlanNodeId>,
    source_location: Option<SourceLocation>,
    #[serde(rename = "type")]
    join_type: Option<JoinType>,
    left: Option<Box<PlanNodeFields>>,
    right: Option<Box<PlanNodeFields>>,
    criteria: Option<Vec<EquiJoinClause>>,
    output_variables: Option<Vec<VariableReference>>,
    filter: Option<RowExpression>,
    left_hash_variable: Option<VariableReference>,
    right_hash_variable: Option<VariableReference>,
    distribution_type: Option<JoinDistributionType>,
    dynamic_filters: Option<DynamicFilterFields>,
}

#[derive(Serialize)]
#[serde(transparent)]
struct DynamicFilterFields(DynamicFilters);

struct DynamicFilterVisitor;

impl<'de> Visitor<'de> for DynamicFilterVisitor {
    type Value = DynamicFilterFields;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from dynamic filter id to column")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut filters = DynamicFilters::new();
        while let Some((filter_id, variable)) = access.next_entry::<String, VariableReference>()? {
            put_dynamic_filter(&mut filters, filter_id, variable);
        }
        Ok(DynamicFilterFields(filters))
    }
}

impl<'de> Deserialize<'de> for DynamicFilterFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DynamicFilterVisitor)
    }
}

impl TryFrom<JoinNodeFields> for JoinNode {
    type Error = PlanError;

    fn try_from(fields: JoinNodeFields) -> PlanResult<Self> {
        JoinNode::builder(
            fields.id.ok_or(PlanError::NullRequiredField("id"))?,
            fields.join_type.ok_or(PlanError::NullRequiredField("type"))?,
            fields.left.ok_or(PlanError::NullRequiredField("left"))?.into_child()?,
            fields.right.ok_or(PlanError::NullRequiredField("right"))?.into_child()?,
        )
        .source_location(fields.source_location)
        .criteria(fields.criteria.ok_or(PlanError::NullRequiredField("criteria"))?)
        .output_variables(
            fields
                .output_variables
                .ok_or(PlanError::NullRequiredField("outputVariables"))?,
        )
        .filter(fields.filter)
        .left_hash_variable(fields.left_hash_variable)
        .right_hash_variable(fields.right_hash_variable)
        .distribution_type(fields.distribution_type)
        .dynamic_filters(
            fields
                .dynamic_filters
                .ok_or(PlanError::NullRequiredField("dynamicFilters"))?
                .0,
        )
        .build()
    }
}

impl From<JoinNode> for JoinNodeFields {
    fn from(node: JoinNode) -> Self {
        JoinNodeFields {
            id: Some(node.id),
            source_location: node.source_location,
            join_type: Some(node.join_type),
            left: Some(PlanNodeFields::child(&node.left)),
            right: Some(PlanNodeFields::child(&node.right)),
            criteria: Some(node.criteria),
            output_variables: Some(node.output_variables),
            filter: node.filter,
            left_hash_variable: node.left_hash_variable,
            right_hash_variable: node.right_hash_variable,
            distribution_type: node.distribution_type,
            dynamic_filters: Some(DynamicFilterFields(node.dynamic_filters)),
        }
    }
}
