//! The built-in `diff` expression function

use super::engine::DiffEngine;
use super::formatter::DiffFormatter;
use crate::model::Value;
use crate::registry::{AuditFunction, FunctionError, FunctionResult};
use crate::scope::ExecutionScope;

/// The registered name of the built-in diff function
pub const DIFF_FUNCTION_NAME: &str = "diff";

/// `#diff(old, new)`: computes the field differences, records the result on
/// the execution scope, and returns the rendered message so it can be
/// embedded in a larger expression.
pub struct DiffFunction {
    engine: DiffEngine,
    formatter: DiffFormatter,
}

impl DiffFunction {
    /// Create the diff function with the given formatter
    pub fn new(formatter: DiffFormatter) -> Self {
        Self {
            engine: DiffEngine::new(),
            formatter,
        }
    }
}

impl AuditFunction for DiffFunction {
    fn name(&self) -> &str {
        DIFF_FUNCTION_NAME
    }

    fn call(&self, args: &[Value], scope: &ExecutionScope) -> FunctionResult<Value> {
        let [old, new] = args else {
            return Err(FunctionError::InvalidArity {
                name: DIFF_FUNCTION_NAME.to_string(),
                expected: 2,
                actual: args.len(),
            });
        };
        log::debug!("DIFF old={old}, new={new}");

        // An absent side or a diff-disabled object renders as the empty
        // string without recording anything
        if old.is_null() || new.is_null() || diff_disabled(old) || diff_disabled(new) {
            return Ok(Value::String(String::new()));
        }

        let result = self.engine.diff(old, new);
        let message = self.formatter.format(&result.fields);
        scope.record_diff(result);
        Ok(Value::String(message))
    }

    fn documentation(&self) -> &str {
        "Diff two objects and render the field changes as one message"
    }
}

fn diff_disabled(value: &Value) -> bool {
    matches!(value, Value::Object(record) if record.is_diff_disabled())
}
