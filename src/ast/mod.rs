//! Abstract syntax tree for audit expressions
//!
//! Kept deliberately small: the expression language covers literals,
//! `#variable` references, `#function(...)` invocations, property access and
//! the usual arithmetic/comparison/logical operators.

mod expression;
mod operator;

pub use expression::{ExpressionNode, LiteralValue};
pub use operator::{BinaryOperator, UnaryOperator};
