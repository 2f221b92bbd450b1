use thiserror::Error;

/// Structural errors raised while building or rewriting a plan node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Required field is missing: {0}")]
    NullRequiredField(&'static str),

    #[error("Left and right join inputs do not contain all output variables, missing: [{missing}]")]
    OutputNotContainedInInputs { missing: String },

    #[error("Cross join does not support output variables pruning or reordering: outputs [{outputs}], inputs [{inputs}]")]
    InvalidCrossJoinProjection { outputs: String, inputs: String },

    #[error("{side} hash variable {variable} is only valid in an equijoin")]
    InvalidHashVariableWithoutCriteria { side: &'static str, variable: String },

    #[error("{join_type} join does not work with {distribution_type} distribution type{reason}")]
    IncompatibleDistributionType {
        join_type: String,
        distribution_type: String,
        reason: &'static str,
    },

    #[error("Right join input doesn't contain variable for dynamic filter {filter_id}: {variable}, right variables: [{right_variables}]")]
    InvalidDynamicFilterTarget {
        filter_id: String,
        variable: String,
        right_variables: String,
    },

    #[error("Not all left output variables are before right output variables: [{outputs}]")]
    OutputOrderingViolation { outputs: String },

    #[error("Unsupported join type: {0}")]
    UnsupportedJoinType(String),

    #[error("Plan node {node} references {variable}, which its source does not produce")]
    UnresolvedVariable { node: String, variable: String },

    #[error("Expected {expected} children, got {actual}")]
    ChildArityMismatch { expected: usize, actual: usize },

    #[error("Codec error: {0}")]
    Codec(String),
}

/// Result type for plan construction and rewrites
pub type PlanResult<T> = Result<T, PlanError>;

/// Render a list of displayable values as `a, b, c` for error messages
pub(crate) fn join_display<T: std::fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
