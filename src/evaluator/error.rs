//! Evaluation error types

use thiserror::Error;

use crate::registry::FunctionError;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors that can occur while evaluating a compiled expression.
///
/// None of these abort the owning business operation: the evaluator's caller
/// records them and falls back to the literal expression text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// A registered function failed
    #[error("function error: {0}")]
    Function(#[from] FunctionError),

    /// Variable is not bound in the context
    #[error("unknown variable '{name}'")]
    UnknownVariable {
        /// Variable name
        name: String,
    },

    /// No function registered under this name
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    /// Property missing on the accessed value
    #[error("property '{property}' not found on {type_name}")]
    PropertyNotFound {
        /// Property name
        property: String,
        /// Type of the accessed value
        type_name: String,
    },

    /// Operand types do not fit the operation
    #[error("type error: expected {expected}, got {actual}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type found
        actual: String,
    },

    /// Division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Anything else (overflow, unsupported operand combination)
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Error message
        message: String,
    },
}
