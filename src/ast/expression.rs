//! Expression node definitions

use rust_decimal::Decimal;

use super::operator::{BinaryOperator, UnaryOperator};

/// A parsed audit expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// Literal value
    Literal(LiteralValue),

    /// Context variable reference (`#name`)
    Variable(String),

    /// Bare identifier, resolved as a property of the root object
    Identifier(String),

    /// Registered function invocation (`#name(args...)`)
    FunctionCall {
        /// Function name
        name: String,
        /// Argument expressions
        args: Vec<ExpressionNode>,
    },

    /// Property access on a base expression (`base.name`)
    PropertyAccess {
        /// Base expression
        base: Box<ExpressionNode>,
        /// Property name
        property: String,
    },

    /// Binary operation
    BinaryOp {
        /// Operator
        op: BinaryOperator,
        /// Left operand
        left: Box<ExpressionNode>,
        /// Right operand
        right: Box<ExpressionNode>,
    },

    /// Unary operation
    UnaryOp {
        /// Operator
        op: UnaryOperator,
        /// Operand
        operand: Box<ExpressionNode>,
    },
}

/// Literal values appearing in expression source text
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Boolean literal (`true`, `false`)
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Decimal literal
    Decimal(Decimal),
    /// String literal (single or double quoted)
    String(String),
    /// Null literal
    Null,
}
