// Row Expressions
//
// Residual join predicates and other already-bound scalar expressions. The
// planner only needs to carry, compare and print them; nothing here
// evaluates a value.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::data_type::DataType;
use super::variable::VariableReference;

/// Literal value inside an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstantValue {
    Null,
    Bigint(i64),
    Double(f64),
    Varchar(String),
    Boolean(bool),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "NULL"),
            ConstantValue::Bigint(i) => write!(f, "{}", i),
            ConstantValue::Double(d) => write!(f, "{}", d),
            ConstantValue::Varchar(s) => write!(f, "'{}'", s),
            ConstantValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A bound scalar expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowExpression {
    /// Reference to an input column
    Variable(VariableReference),
    /// Typed literal
    Constant {
        value: ConstantValue,
        #[serde(rename = "type")]
        data_type: DataType,
    },
    /// Function or operator call, e.g. `$operator$less_than(a, b)` or `and`
    Call {
        function: String,
        arguments: Vec<RowExpression>,
        #[serde(rename = "returnType")]
        return_type: DataType,
    },
}

impl RowExpression {
    pub fn variable(variable: VariableReference) -> Self {
        RowExpression::Variable(variable)
    }

    pub fn constant(value: ConstantValue, data_type: DataType) -> Self {
        RowExpression::Constant { value, data_type }
    }

    pub fn call(function: impl Into<String>, arguments: Vec<RowExpression>, return_type: DataType) -> Self {
        RowExpression::Call {
            function: function.into(),
            arguments,
            return_type,
        }
    }

    /// Boolean comparison `left <op> right`
    pub fn comparison(op: &str, left: RowExpression, right: RowExpression) -> Self {
        Self::call(op, vec![left, right], DataType::Boolean)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            RowExpression::Variable(variable) => variable.data_type(),
            RowExpression::Constant { data_type, .. } => *data_type,
            RowExpression::Call { return_type, .. } => *return_type,
        }
    }

    /// All columns this expression reads
    pub fn variables(&self) -> BTreeSet<VariableReference> {
        let mut variables = BTreeSet::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables(&self, variables: &mut BTreeSet<VariableReference>) {
        match self {
            RowExpression::Variable(variable) => {
                variables.insert(variable.clone());
            }
            RowExpression::Constant { .. } => {}
            RowExpression::Call { arguments, .. } => {
                for argument in arguments {
                    argument.collect_variables(variables);
                }
            }
        }
    }
}

impl From<VariableReference> for RowExpression {
    fn from(variable: VariableReference) -> Self {
        RowExpression::Variable(variable)
    }
}

impl fmt::Display for RowExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowExpression::Variable(variable) => write!(f, "{}", variable),
            RowExpression::Constant { value, .. } => write!(f, "{}", value),
            RowExpression::Call { function, arguments, .. } => {
                let args = arguments
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}({})", function, args)
            }
        }
    }
}
