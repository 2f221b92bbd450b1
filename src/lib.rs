// Distributed join planning IR
//
// Immutable plan nodes for a distributed SQL planner, centred on the join
// node and the structural rules that keep it valid.

pub mod common;
pub mod expression;
pub mod plan;

// Re-export key items for convenient access
pub use common::types::{PlanNodeId, PlanNodeIdAllocator, SourceLocation};
pub use expression::{DataType, RowExpression, VariableReference};
pub use plan::{
    EquiJoinClause, JoinDistributionType, JoinNode, JoinNodeBuilder, JoinType, PlanError, PlanNode, PlanResult,
    PlanVisitor,
};
