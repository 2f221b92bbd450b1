use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expression::VariableReference;

/// `left = right` condition between one column from each join input
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquiJoinClause {
    left: VariableReference,
    right: VariableReference,
}

impl EquiJoinClause {
    pub fn new(left: VariableReference, right: VariableReference) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &VariableReference {
        &self.left
    }

    pub fn right(&self) -> &VariableReference {
        &self.right
    }

    pub fn flip(&self) -> EquiJoinClause {
        EquiJoinClause::new(self.right.clone(), self.left.clone())
    }
}

impl fmt::Display for EquiJoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}
