//! Expression evaluator
//!
//! Resolves raw expression text to a string result against the current
//! execution scope. A broken expression never aborts the owning business
//! operation: the error is recorded on the scope and the literal text is
//! returned instead.

use std::cmp::Ordering;
use std::sync::Arc;

use super::cache::ExpressionCache;
use super::error::{EvaluationError, EvaluationResult};
use crate::ast::{BinaryOperator, ExpressionNode, LiteralValue, UnaryOperator};
use crate::error::AuditError;
use crate::model::Value;
use crate::scope::ExecutionScope;

/// Orchestrates the expression cache and the evaluation context to turn raw
/// expression text into a string result.
#[derive(Clone, Default)]
pub struct Evaluator {
    cache: Arc<ExpressionCache>,
}

impl Evaluator {
    /// Create an evaluator with its own cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an evaluator sharing an existing cache
    pub fn with_cache(cache: Arc<ExpressionCache>) -> Self {
        Self { cache }
    }

    /// The underlying expression cache
    pub fn cache(&self) -> &Arc<ExpressionCache> {
        &self.cache
    }

    /// Resolve expression text, degrading to the literal text on any error.
    ///
    /// Blank text is returned unchanged: many declared fields are optional
    /// and default to empty text meaning "no value". On compile or
    /// evaluation failure the error is recorded on the scope and the raw
    /// text is returned.
    pub fn evaluate(&self, expression: &str, scope: &ExecutionScope) -> String {
        if expression.trim().is_empty() {
            return expression.to_string();
        }
        match self.try_evaluate(expression, scope) {
            Ok(rendered) => rendered,
            Err(error) => {
                log::error!("Evaluate expression error: {error}");
                scope.record_error(error.to_string());
                expression.to_string()
            }
        }
    }

    /// Resolve expression text, surfacing the error instead of falling back
    pub fn try_evaluate(
        &self,
        expression: &str,
        scope: &ExecutionScope,
    ) -> Result<String, AuditError> {
        if expression.trim().is_empty() {
            return Ok(expression.to_string());
        }
        let method = scope.with_context(|context| context.method().clone())?;
        let compiled = self.cache.get_or_compile(&method, expression)?;
        let value = self.eval_node(&compiled, scope)?;
        Ok(value.to_string())
    }

    // The context lock is taken only for individual lookups, never across a
    // function call: registered functions are free to use the scope (record
    // diffs and errors, bind variables) while the evaluator is running.
    fn eval_node(&self, node: &ExpressionNode, scope: &ExecutionScope) -> Result<Value, AuditError> {
        match node {
            ExpressionNode::Literal(literal) => Ok(literal_value(literal)),

            ExpressionNode::Variable(name) => scope
                .with_context(|context| context.lookup_variable(name))?
                .ok_or_else(|| EvaluationError::UnknownVariable { name: name.clone() }.into()),

            ExpressionNode::Identifier(name) => {
                let root = scope.with_context(|context| context.root().clone())?;
                Ok(property_of(&root, name)?)
            }

            ExpressionNode::FunctionCall { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_node(arg, scope)?);
                }
                let function = scope
                    .with_context(|context| context.lookup_function(name))?
                    .ok_or_else(|| EvaluationError::UnknownFunction { name: name.clone() })?;
                let result = function.call(&values, scope).map_err(EvaluationError::from)?;
                Ok(result)
            }

            ExpressionNode::PropertyAccess { base, property } => {
                let value = self.eval_node(base, scope)?;
                Ok(property_of(&value, property)?)
            }

            ExpressionNode::BinaryOp { op, left, right } => match op {
                // Logical operators short-circuit
                BinaryOperator::And => {
                    if !expect_boolean(&self.eval_node(left, scope)?)? {
                        return Ok(Value::Boolean(false));
                    }
                    let right = expect_boolean(&self.eval_node(right, scope)?)?;
                    Ok(Value::Boolean(right))
                }
                BinaryOperator::Or => {
                    if expect_boolean(&self.eval_node(left, scope)?)? {
                        return Ok(Value::Boolean(true));
                    }
                    let right = expect_boolean(&self.eval_node(right, scope)?)?;
                    Ok(Value::Boolean(right))
                }
                _ => {
                    let left = self.eval_node(left, scope)?;
                    let right = self.eval_node(right, scope)?;
                    Ok(apply_binary(*op, &left, &right)?)
                }
            },

            ExpressionNode::UnaryOp { op, operand } => {
                let value = self.eval_node(operand, scope)?;
                match op {
                    UnaryOperator::Not => Ok(Value::Boolean(!expect_boolean(&value)?)),
                    UnaryOperator::Minus => match value {
                        Value::Integer(i) => Ok(i.checked_neg().map(Value::Integer).ok_or_else(
                            || EvaluationError::InvalidOperation {
                                message: "integer overflow".to_string(),
                            },
                        )?),
                        Value::Decimal(d) => Ok(Value::Decimal(-d)),
                        other => Err(EvaluationError::TypeError {
                            expected: "number".to_string(),
                            actual: other.type_name().to_string(),
                        }
                        .into()),
                    },
                }
            }
        }
    }
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Boolean(b) => Value::Boolean(*b),
        LiteralValue::Integer(i) => Value::Integer(*i),
        LiteralValue::Decimal(d) => Value::Decimal(*d),
        LiteralValue::String(s) => Value::String(s.clone()),
        LiteralValue::Null => Value::Null,
    }
}

fn property_of(value: &Value, property: &str) -> EvaluationResult<Value> {
    match value {
        Value::Object(record) => record
            .field(property)
            .map(|field| field.value().clone())
            .ok_or_else(|| EvaluationError::PropertyNotFound {
                property: property.to_string(),
                type_name: record.type_name().to_string(),
            }),
        Value::Null => Err(EvaluationError::PropertyNotFound {
            property: property.to_string(),
            type_name: "Null".to_string(),
        }),
        other => Err(EvaluationError::TypeError {
            expected: "Object".to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

fn expect_boolean(value: &Value) -> EvaluationResult<bool> {
    value
        .as_boolean()
        .ok_or_else(|| EvaluationError::TypeError {
            expected: "Boolean".to_string(),
            actual: value.type_name().to_string(),
        })
}

fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> EvaluationResult<Value> {
    match op {
        BinaryOperator::Add => {
            // String on either side turns + into concatenation
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                return Ok(Value::String(format!("{left}{right}")));
            }
            numeric_op(op, left, right)
        }
        BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => numeric_op(op, left, right),

        BinaryOperator::Equal => Ok(Value::Boolean(values_equal(left, right))),
        BinaryOperator::NotEqual => Ok(Value::Boolean(!values_equal(left, right))),

        BinaryOperator::LessThan => compare(left, right).map(|o| Value::Boolean(o.is_lt())),
        BinaryOperator::LessThanOrEqual => compare(left, right).map(|o| Value::Boolean(o.is_le())),
        BinaryOperator::GreaterThan => compare(left, right).map(|o| Value::Boolean(o.is_gt())),
        BinaryOperator::GreaterThanOrEqual => {
            compare(left, right).map(|o| Value::Boolean(o.is_ge()))
        }

        // And/Or are handled with short-circuiting by the caller
        BinaryOperator::And | BinaryOperator::Or => Err(EvaluationError::InvalidOperation {
            message: format!("operator {op} requires boolean operands"),
        }),
    }
}

fn numeric_op(op: BinaryOperator, left: &Value, right: &Value) -> EvaluationResult<Value> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        let result = match op {
            BinaryOperator::Add => l.checked_add(*r),
            BinaryOperator::Subtract => l.checked_sub(*r),
            BinaryOperator::Multiply => l.checked_mul(*r),
            BinaryOperator::Divide => {
                if *r == 0 {
                    return Err(EvaluationError::DivisionByZero);
                }
                l.checked_div(*r)
            }
            BinaryOperator::Modulo => {
                if *r == 0 {
                    return Err(EvaluationError::DivisionByZero);
                }
                l.checked_rem(*r)
            }
            _ => None,
        };
        return result
            .map(Value::Integer)
            .ok_or_else(|| EvaluationError::InvalidOperation {
                message: "integer overflow".to_string(),
            });
    }

    let (Some(l), Some(r)) = (left.as_decimal(), right.as_decimal()) else {
        return Err(EvaluationError::TypeError {
            expected: "number".to_string(),
            actual: format!("{} {op} {}", left.type_name(), right.type_name()),
        });
    };
    let result = match op {
        BinaryOperator::Add => l.checked_add(r),
        BinaryOperator::Subtract => l.checked_sub(r),
        BinaryOperator::Multiply => l.checked_mul(r),
        BinaryOperator::Divide => {
            if r.is_zero() {
                return Err(EvaluationError::DivisionByZero);
            }
            l.checked_div(r)
        }
        BinaryOperator::Modulo => {
            if r.is_zero() {
                return Err(EvaluationError::DivisionByZero);
            }
            l.checked_rem(r)
        }
        _ => None,
    };
    result
        .map(Value::Decimal)
        .ok_or_else(|| EvaluationError::InvalidOperation {
            message: "decimal overflow".to_string(),
        })
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (left.as_decimal(), right.as_decimal()) {
        return l == r;
    }
    left == right
}

fn compare(left: &Value, right: &Value) -> EvaluationResult<Ordering> {
    let ordering = match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Date(l), Value::Date(r)) => Some(l.cmp(r)),
        (Value::DateTime(l), Value::DateTime(r)) => Some(l.cmp(r)),
        _ => left
            .as_decimal()
            .zip(right.as_decimal())
            .map(|(l, r)| l.cmp(&r)),
    };
    ordering.ok_or_else(|| EvaluationError::TypeError {
        expected: "comparable operands".to_string(),
        actual: format!("{} and {}", left.type_name(), right.type_name()),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::evaluator::MethodIdentity;
    use crate::model::ObjectRecord;
    use crate::registry::{
        AuditFunction, ClosureFunction, FunctionError, FunctionRegistry, FunctionResult,
    };
    use crate::scope::Invocation;

    fn scope_with(registry: &FunctionRegistry, arguments: Vec<Value>) -> ExecutionScope {
        let scope = ExecutionScope::new();
        let invocation = Invocation::new(
            Value::Null,
            MethodIdentity::new("OrderService", "createOrder", ["request"]),
            arguments,
        );
        scope.context_for(&invocation, registry);
        scope
    }

    #[test]
    fn test_blank_text_returned_unchanged() {
        let evaluator = Evaluator::new();
        let scope = ExecutionScope::new();
        assert_eq!(evaluator.evaluate("", &scope), "");
        assert_eq!(evaluator.evaluate("   ", &scope), "   ");
        assert_eq!(evaluator.cache().compile_count(), 0);
    }

    #[test]
    fn test_literal_and_concat() {
        let evaluator = Evaluator::new();
        let registry = FunctionRegistry::new();
        let scope = scope_with(&registry, vec![Value::from("幸福小区1号")]);

        assert_eq!(
            evaluator.evaluate("'new address: ' + #request", &scope),
            "new address: 幸福小区1号"
        );
        assert!(scope.errors().is_empty());
    }

    #[test]
    fn test_function_invocation_with_property_argument() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(Arc::new(ClosureFunction::new(
                "findUserName",
                |args: &[Value]| match args {
                    [Value::String(id)] => Ok(Value::String(format!("user-{id}"))),
                    _ => Err(FunctionError::Failed {
                        name: "findUserName".to_string(),
                        message: "expected one string".to_string(),
                    }),
                },
            )))
            .unwrap();

        let request = ObjectRecord::builder("CreateOrderRequest")
            .field("userId", "42")
            .build();
        let scope = scope_with(&registry, vec![request.into()]);
        let evaluator = Evaluator::new();

        assert_eq!(
            evaluator.evaluate("'I am create order: ' + #findUserName(#request.userId)", &scope),
            "I am create order: user-42"
        );
    }

    // Binds a scope variable from inside the function body, which must not
    // block the evaluation that triggered the call.
    struct RememberFunction;

    impl AuditFunction for RememberFunction {
        fn name(&self) -> &str {
            "remember"
        }

        fn call(&self, args: &[Value], scope: &ExecutionScope) -> FunctionResult<Value> {
            scope.put_variable("seen", args[0].clone());
            Ok(args[0].clone())
        }
    }

    #[test]
    fn test_function_may_bind_scope_variables_during_evaluation() {
        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(RememberFunction)).unwrap();
        let scope = scope_with(&registry, vec![Value::Integer(41)]);
        let evaluator = Evaluator::new();

        assert_eq!(evaluator.evaluate("#remember(#request) + #seen", &scope), "82");
        assert!(scope.errors().is_empty());
        let seen = scope.with_context(|ctx| ctx.lookup_variable("seen")).unwrap();
        assert_eq!(seen, Some(Value::Integer(41)));
    }

    #[test]
    fn test_error_falls_back_to_literal_text() {
        let evaluator = Evaluator::new();
        let registry = FunctionRegistry::new();
        let scope = scope_with(&registry, vec![]);

        let raw = "#noSuchVariable + 1";
        assert_eq!(evaluator.evaluate(raw, &scope), raw);
        assert_eq!(scope.errors().len(), 1);
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        let evaluator = Evaluator::new();
        let registry = FunctionRegistry::new();
        let scope = scope_with(&registry, vec![Value::Integer(22)]);

        assert_eq!(evaluator.evaluate("#request + 1", &scope), "23");
        assert_eq!(evaluator.evaluate("#request > 18 && #request < 65", &scope), "true");
        assert_eq!(evaluator.evaluate("10 / 4.0", &scope), "2.5");
        assert_eq!(evaluator.evaluate("7 % 3", &scope), "1");
    }

    #[test]
    fn test_unary_over_property_access() {
        let evaluator = Evaluator::new();
        let registry = FunctionRegistry::new();
        let request: Value = ObjectRecord::builder("Adjustment")
            .field("amount", 5)
            .field("credit", false)
            .build()
            .into();
        let scope = scope_with(&registry, vec![request]);

        assert_eq!(evaluator.evaluate("-#request.amount", &scope), "-5");
        assert_eq!(evaluator.evaluate("!#request.credit", &scope), "true");
        assert!(scope.errors().is_empty());
    }

    #[test]
    fn test_division_by_zero_recorded() {
        let evaluator = Evaluator::new();
        let registry = FunctionRegistry::new();
        let scope = scope_with(&registry, vec![]);

        assert_eq!(evaluator.evaluate("1 / 0", &scope), "1 / 0");
        assert_eq!(scope.errors().len(), 1);
    }

    #[test]
    fn test_missing_context() {
        let evaluator = Evaluator::new();
        let scope = ExecutionScope::new();
        assert_eq!(
            evaluator.try_evaluate("1 + 1", &scope),
            Err(AuditError::MissingContext)
        );
    }
}
