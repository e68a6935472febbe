//! Pratt parser for audit expressions
//!
//! Precedence climbing over the tokenizer's output. All binary operator
//! precedence lives in one table; postfix property access binds tightest.

use rust_decimal::Decimal;

use super::error::{ParseError, ParseResult};
use super::tokenizer::{Token, Tokenizer};
use crate::ast::{BinaryOperator, ExpressionNode, LiteralValue, UnaryOperator};

/// Operator precedence levels (higher = tighter binding)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Logical OR
    Or = 1,
    /// Logical AND
    And = 2,
    /// Equality operators (==, !=)
    Equality = 3,
    /// Ordering operators (<, <=, >, >=)
    Inequality = 4,
    /// Additive operators (+, -)
    Additive = 5,
    /// Multiplicative operators (*, /, %)
    Multiplicative = 6,
    /// Unary operators (-, !)
    Unary = 7,
    /// Property access (.)
    Invocation = 8,
}

impl Precedence {
    /// Next higher level, used for left-associative climbing
    const fn next_level(self) -> Self {
        match self {
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Inequality,
            Precedence::Inequality => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Invocation,
            Precedence::Invocation => Precedence::Invocation,
        }
    }
}

fn get_precedence(token: &Token<'_>) -> Option<Precedence> {
    match token {
        Token::Dot => Some(Precedence::Invocation),
        Token::Star | Token::Slash | Token::Percent => Some(Precedence::Multiplicative),
        Token::Plus | Token::Minus => Some(Precedence::Additive),
        Token::LessThan
        | Token::LessThanOrEqual
        | Token::GreaterThan
        | Token::GreaterThanOrEqual => Some(Precedence::Inequality),
        Token::EqualEqual | Token::NotEqual => Some(Precedence::Equality),
        Token::And => Some(Precedence::And),
        Token::Or => Some(Precedence::Or),
        _ => None,
    }
}

fn token_to_binary_op(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        Token::Star => Some(BinaryOperator::Multiply),
        Token::Slash => Some(BinaryOperator::Divide),
        Token::Percent => Some(BinaryOperator::Modulo),
        Token::EqualEqual => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::LessThan => Some(BinaryOperator::LessThan),
        Token::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
        Token::GreaterThan => Some(BinaryOperator::GreaterThan),
        Token::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
        Token::And => Some(BinaryOperator::And),
        Token::Or => Some(BinaryOperator::Or),
        _ => None,
    }
}

/// Resolve backslash escapes in a raw string-literal slice
fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Recursive-descent core with a Pratt loop for binary operators
pub struct Parser<'input> {
    tokenizer: Tokenizer<'input>,
    current_token: Option<Token<'input>>,
}

impl<'input> Parser<'input> {
    /// Create a parser over the input
    pub fn new(input: &'input str) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            current_token: None,
        }
    }

    /// Parse the whole input as one expression
    pub fn parse(mut self) -> ParseResult<ExpressionNode> {
        self.advance()?;
        let expression = self.parse_expression(Precedence::Or)?;
        match self.current_token {
            None => Ok(expression),
            Some(ref token) => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                expected: "end of expression".to_string(),
                position: self.tokenizer.position(),
            }),
        }
    }

    fn advance(&mut self) -> ParseResult<()> {
        self.current_token = self.tokenizer.next_token()?;
        Ok(())
    }

    fn parse_expression(&mut self, min_precedence: Precedence) -> ParseResult<ExpressionNode> {
        let mut left = self.parse_unary()?;

        while let Some(token) = &self.current_token {
            let Some(precedence) = get_precedence(token) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }

            if matches!(token, Token::Dot) {
                self.advance()?;
                let property = self.expect_identifier()?;
                left = ExpressionNode::PropertyAccess {
                    base: Box::new(left),
                    property,
                };
                continue;
            }

            // All binary operators are left-associative
            let op = token_to_binary_op(token).ok_or_else(|| ParseError::UnexpectedToken {
                found: token.describe(),
                expected: "binary operator".to_string(),
                position: self.tokenizer.position(),
            })?;
            self.advance()?;
            let right = self.parse_expression(precedence.next_level())?;
            left = ExpressionNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<ExpressionNode> {
        match self.current_token {
            Some(Token::Minus) => {
                self.advance()?;
                // Postfix property access binds tighter than unary
                let operand = self.parse_expression(Precedence::Unary)?;
                Ok(ExpressionNode::UnaryOp {
                    op: UnaryOperator::Minus,
                    operand: Box::new(operand),
                })
            }
            Some(Token::Not) => {
                self.advance()?;
                let operand = self.parse_expression(Precedence::Unary)?;
                Ok(ExpressionNode::UnaryOp {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<ExpressionNode> {
        let token = self.current_token.take().ok_or(ParseError::UnexpectedEof)?;
        match token {
            Token::Integer(value) => {
                self.advance()?;
                Ok(ExpressionNode::Literal(LiteralValue::Integer(value)))
            }
            Token::Decimal(text) => {
                let position = self.tokenizer.position();
                let value =
                    text.parse::<Decimal>()
                        .map_err(|_| ParseError::InvalidNumber {
                            text: text.to_string(),
                            position,
                        })?;
                self.advance()?;
                Ok(ExpressionNode::Literal(LiteralValue::Decimal(value)))
            }
            Token::String(raw) => {
                self.advance()?;
                Ok(ExpressionNode::Literal(LiteralValue::String(unescape(raw))))
            }
            Token::True => {
                self.advance()?;
                Ok(ExpressionNode::Literal(LiteralValue::Boolean(true)))
            }
            Token::False => {
                self.advance()?;
                Ok(ExpressionNode::Literal(LiteralValue::Boolean(false)))
            }
            Token::Null => {
                self.advance()?;
                Ok(ExpressionNode::Literal(LiteralValue::Null))
            }
            Token::Hash => {
                self.advance()?;
                let name = self.expect_identifier()?;
                if matches!(self.current_token, Some(Token::LeftParen)) {
                    let args = self.parse_arguments()?;
                    Ok(ExpressionNode::FunctionCall { name, args })
                } else {
                    Ok(ExpressionNode::Variable(name))
                }
            }
            Token::Identifier(name) => {
                let name = name.to_string();
                self.advance()?;
                if matches!(self.current_token, Some(Token::LeftParen)) {
                    let args = self.parse_arguments()?;
                    Ok(ExpressionNode::FunctionCall { name, args })
                } else {
                    Ok(ExpressionNode::Identifier(name))
                }
            }
            Token::LeftParen => {
                self.advance()?;
                let inner = self.parse_expression(Precedence::Or)?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                expected: "literal, variable, function call or '('".to_string(),
                position: self.tokenizer.position(),
            }),
        }
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<ExpressionNode>> {
        self.expect(Token::LeftParen)?;
        let mut args = Vec::new();
        if matches!(self.current_token, Some(Token::RightParen)) {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression(Precedence::Or)?);
            match self.current_token {
                Some(Token::Comma) => self.advance()?,
                Some(Token::RightParen) => {
                    self.advance()?;
                    return Ok(args);
                }
                Some(ref token) => {
                    return Err(ParseError::UnexpectedToken {
                        found: token.describe(),
                        expected: "',' or ')'".to_string(),
                        position: self.tokenizer.position(),
                    });
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }

    fn expect(&mut self, expected: Token<'input>) -> ParseResult<()> {
        match self.current_token {
            Some(ref token) if *token == expected => self.advance(),
            Some(ref token) => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                expected: expected.describe(),
                position: self.tokenizer.position(),
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.current_token.take() {
            Some(Token::Identifier(name)) => {
                self.advance()?;
                Ok(name.to_string())
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                expected: "identifier".to_string(),
                position: self.tokenizer.position(),
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }
}
