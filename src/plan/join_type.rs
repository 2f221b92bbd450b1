use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::equi_join::EquiJoinClause;
use super::error::{PlanError, PlanResult};

/// Logical join semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub const ALL: [JoinType; 4] = [JoinType::Inner, JoinType::Left, JoinType::Right, JoinType::Full];

    /// Name used for the join in plan output
    pub fn label(&self) -> &'static str {
        match self {
            JoinType::Inner => "InnerJoin",
            JoinType::Left => "LeftJoin",
            JoinType::Right => "RightJoin",
            JoinType::Full => "FullJoin",
        }
    }

    /// A replicated build side would emit its unmatched rows once per
    /// probe worker, so these types need hash partitioning.
    pub fn must_partition(&self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }

    /// Without equi criteria there is nothing to partition on.
    pub fn must_replicate(&self, criteria: &[EquiJoinClause]) -> bool {
        criteria.is_empty() && matches!(self, JoinType::Inner | JoinType::Left)
    }

    /// Join type to use once the two inputs trade places
    pub fn flip(&self) -> JoinType {
        match self {
            JoinType::Inner => JoinType::Inner,
            JoinType::Full => JoinType::Full,
            JoinType::Left => JoinType::Right,
            JoinType::Right => JoinType::Left,
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
        };
        f.write_str(name)
    }
}

impl FromStr for JoinType {
    type Err = PlanError;

    fn from_str(s: &str) -> PlanResult<Self> {
        match s.to_uppercase().as_str() {
            "INNER" => Ok(JoinType::Inner),
            "LEFT" => Ok(JoinType::Left),
            "RIGHT" => Ok(JoinType::Right),
            "FULL" => Ok(JoinType::Full),
            _ => Err(PlanError::UnsupportedJoinType(s.to_string())),
        }
    }
}

/// Physical strategy for moving join inputs between workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinDistributionType {
    /// Both sides shuffled by join key hash
    Partitioned,
    /// Build side broadcast to every probe worker
    Replicated,
}

impl fmt::Display for JoinDistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinDistributionType::Partitioned => f.write_str("PARTITIONED"),
            JoinDistributionType::Replicated => f.write_str("REPLICATED"),
        }
    }
}

impl FromStr for JoinDistributionType {
    type Err = PlanError;

    fn from_str(s: &str) -> PlanResult<Self> {
        match s.to_uppercase().as_str() {
            "PARTITIONED" => Ok(JoinDistributionType::Partitioned),
            "REPLICATED" => Ok(JoinDistributionType::Replicated),
            _ => Err(PlanError::Codec(format!("unknown distribution type: {}", s))),
        }
    }
}
