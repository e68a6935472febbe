//! Expression parser: hand-rolled tokenizer plus a small Pratt parser

mod error;
mod pratt;
mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::Parser;
pub use tokenizer::{Token, Tokenizer};

use crate::ast::ExpressionNode;

/// Parse an audit expression into its AST
pub fn parse_expression(input: &str) -> ParseResult<ExpressionNode> {
    Parser::new(input).parse()
}
