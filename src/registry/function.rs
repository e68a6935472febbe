//! The callable function contract

use thiserror::Error;

use crate::model::Value;
use crate::scope::ExecutionScope;

/// Result type for function invocations
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Errors raised by registered functions at evaluation time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    /// Wrong number of arguments
    #[error("function '{name}' expects {expected} arguments, got {actual}")]
    InvalidArity {
        /// Function name
        name: String,
        /// Expected argument count
        expected: usize,
        /// Actual argument count
        actual: usize,
    },

    /// An argument had an unusable type
    #[error("function '{name}' argument {index} expects {expected}, got {actual}")]
    InvalidArgumentType {
        /// Function name
        name: String,
        /// Argument index
        index: usize,
        /// Expected type
        expected: String,
        /// Actual type found
        actual: String,
    },

    /// The function body failed
    #[error("function '{name}' failed: {message}")]
    Failed {
        /// Function name
        name: String,
        /// Failure message
        message: String,
    },
}

/// A named callable invocable from audit expressions.
///
/// Implementations receive the current [`ExecutionScope`] so that functions
/// like `diff` can append results to the running operation; binding
/// variables and recording errors from inside a call is equally fine, the
/// evaluator does not hold the context lock while a function runs.
pub trait AuditFunction: Send + Sync {
    /// The registered function name
    fn name(&self) -> &str;

    /// Invoke the function with already-evaluated arguments
    fn call(&self, args: &[Value], scope: &ExecutionScope) -> FunctionResult<Value>;

    /// Optional human documentation
    fn documentation(&self) -> &str {
        ""
    }
}

/// Adapter turning a plain closure into an [`AuditFunction`].
///
/// The closure never sees the scope; most business helpers only map argument
/// values to a result.
pub struct ClosureFunction<F> {
    name: String,
    callable: F,
}

impl<F> ClosureFunction<F>
where
    F: Fn(&[Value]) -> FunctionResult<Value> + Send + Sync,
{
    /// Wrap a closure under the given name
    pub fn new(name: impl Into<String>, callable: F) -> Self {
        Self {
            name: name.into(),
            callable,
        }
    }
}

impl<F> AuditFunction for ClosureFunction<F>
where
    F: Fn(&[Value]) -> FunctionResult<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: &[Value], _scope: &ExecutionScope) -> FunctionResult<Value> {
        (self.callable)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_function() {
        let double = ClosureFunction::new("double", |args: &[Value]| match args {
            [Value::Integer(i)] => Ok(Value::Integer(i * 2)),
            _ => Err(FunctionError::InvalidArity {
                name: "double".to_string(),
                expected: 1,
                actual: args.len(),
            }),
        });

        let scope = ExecutionScope::new();
        assert_eq!(
            double.call(&[Value::Integer(21)], &scope),
            Ok(Value::Integer(42))
        );
        assert!(double.call(&[], &scope).is_err());
    }
}
