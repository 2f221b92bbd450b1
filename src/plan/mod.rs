// Plan Module
//
// Plan node IR consumed by the optimizer: the join node with its
// construction rules, the surrounding node kinds, and the protocols
// (visitor, logical properties, codec) shared by all of them.

pub mod codec;
pub mod equi_join;
pub mod error;
pub mod join;
pub mod join_type;
pub mod node;
pub mod nodes;
pub mod printer;
pub mod properties;
pub mod visitor;

// Export key types
pub use self::equi_join::EquiJoinClause;
pub use self::error::{PlanError, PlanResult};
pub use self::join::{DynamicFilters, JoinNode, JoinNodeBuilder, check_left_output_variables_before_right};
pub use self::join_type::{JoinDistributionType, JoinType};
pub use self::node::PlanNode;
pub use self::nodes::{Assignment, FilterNode, ProjectNode, TableScanNode};
pub use self::printer::{PlanPrinter, PrinterConfig};
pub use self::properties::LogicalPropertiesProvider;
pub use self::visitor::PlanVisitor;
