use super::join::JoinNode;
use super::nodes::{FilterNode, ProjectNode, TableScanNode};

/// Derives logical properties (keys, row bounds, ...) for plan nodes.
///
/// What a property set contains is up to the statistics layer; plan nodes
/// only route to the method for their kind.
pub trait LogicalPropertiesProvider {
    type Properties;

    fn table_scan_properties(&self, node: &TableScanNode) -> Self::Properties;

    fn filter_properties(&self, node: &FilterNode) -> Self::Properties;

    fn project_properties(&self, node: &ProjectNode) -> Self::Properties;

    fn join_properties(&self, node: &JoinNode) -> Self::Properties;
}
