// Expression Layer
//
// Resolved column references and bound row expressions consumed by plan
// nodes.

use thiserror::Error;

pub mod data_type;
pub mod row_expression;
pub mod variable;

pub use data_type::DataType;
pub use row_expression::{ConstantValue, RowExpression};
pub use variable::VariableReference;

/// Errors raised while building expressions from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Unknown data type: {0}")]
    UnknownType(String),
}

pub type ExpressionResult<T> = Result<T, ExpressionError>;
