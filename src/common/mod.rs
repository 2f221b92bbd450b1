pub mod types;

pub use types::{PlanNodeId, PlanNodeIdAllocator, SourceLocation};
