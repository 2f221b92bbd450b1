use std::fmt;

use serde::{Deserialize, Serialize};

use super::data_type::DataType;

/// A resolved output column.
///
/// Two references are the same column when both name and type match; no
/// other identity is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableReference {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
}

impl VariableReference {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

impl fmt::Display for VariableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Shorthand for a bigint column, mostly used when wiring up plans by hand
pub fn bigint(name: &str) -> VariableReference {
    VariableReference::new(name, DataType::Bigint)
}
