// Plan Codec
//
// Two encodings of the same serde model: a JSON property bag for humans and
// tooling, and compact bincode bytes for shipping plan fragments between
// workers. Decoding either one first reads the raw tree, then rebuilds it
// bottom-up through the validating constructors, so callers see the same
// PlanError variants a builder would return.

use log::debug;

use super::error::{PlanError, PlanResult};
use super::node::{PlanNode, PlanNodeFields};

/// Pretty-printed JSON property bag
pub fn to_json(plan: &PlanNode) -> PlanResult<String> {
    serde_json::to_string_pretty(plan).map_err(|e| PlanError::Codec(e.to_string()))
}

pub fn from_json(text: &str) -> PlanResult<PlanNode> {
    let fields: PlanNodeFields = serde_json::from_str(text).map_err(|e| {
        debug!("Failed to decode plan from JSON: {}", e);
        PlanError::Codec(e.to_string())
    })?;
    build(fields)
}

/// Wire bytes
pub fn encode(plan: &PlanNode) -> PlanResult<Vec<u8>> {
    bincode::serialize(plan).map_err(|e| PlanError::Codec(e.to_string()))
}

pub fn decode(bytes: &[u8]) -> PlanResult<PlanNode> {
    let fields: PlanNodeFields = bincode::deserialize(bytes).map_err(|e| {
        debug!("Failed to decode {} plan bytes: {}", bytes.len(), e);
        PlanError::Codec(e.to_string())
    })?;
    build(fields)
}

fn build(fields: PlanNodeFields) -> PlanResult<PlanNode> {
    PlanNode::try_from(fields).map_err(|e| {
        debug!("Decoded plan is invalid: {}", e);
        e
    })
}
