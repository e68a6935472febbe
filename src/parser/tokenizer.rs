//! Zero-copy tokenizer for audit expressions
//!
//! String literal tokens keep the raw slice between the quotes; escape
//! sequences are resolved by the parser when it builds the literal node.

use super::error::{ParseError, ParseResult};

/// Lexical token over a borrowed input slice
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    /// Integer literal
    Integer(i64),
    /// Decimal literal as raw text, parsed when the AST is built
    Decimal(&'input str),
    /// String literal contents (raw, escapes unresolved)
    String(&'input str),
    /// Identifier
    Identifier(&'input str),
    /// Boolean literal `true`
    True,
    /// Boolean literal `false`
    False,
    /// Null literal
    Null,
    /// Variable/function marker (#)
    Hash,
    /// Addition or concatenation operator (+)
    Plus,
    /// Subtraction operator (-)
    Minus,
    /// Multiplication operator (*)
    Star,
    /// Division operator (/)
    Slash,
    /// Remainder operator (%)
    Percent,
    /// Equality operator (==)
    EqualEqual,
    /// Inequality operator (!=)
    NotEqual,
    /// Less than operator (<)
    LessThan,
    /// Less than or equal operator (<=)
    LessThanOrEqual,
    /// Greater than operator (>)
    GreaterThan,
    /// Greater than or equal operator (>=)
    GreaterThanOrEqual,
    /// Logical AND (&& or the `and` keyword)
    And,
    /// Logical OR (|| or the `or` keyword)
    Or,
    /// Logical NOT (! or the `not` keyword)
    Not,
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Argument separator (,)
    Comma,
    /// Property access operator (.)
    Dot,
}

impl Token<'_> {
    /// Short description used in parse error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Integer(i) => format!("integer '{i}'"),
            Token::Decimal(d) => format!("decimal '{d}'"),
            Token::String(_) => "string literal".to_string(),
            Token::Identifier(name) => format!("identifier '{name}'"),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::Null => "'null'".to_string(),
            Token::Hash => "'#'".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Percent => "'%'".to_string(),
            Token::EqualEqual => "'=='".to_string(),
            Token::NotEqual => "'!='".to_string(),
            Token::LessThan => "'<'".to_string(),
            Token::LessThanOrEqual => "'<='".to_string(),
            Token::GreaterThan => "'>'".to_string(),
            Token::GreaterThanOrEqual => "'>='".to_string(),
            Token::And => "'&&'".to_string(),
            Token::Or => "'||'".to_string(),
            Token::Not => "'!'".to_string(),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Dot => "'.'".to_string(),
        }
    }
}

/// Byte-oriented scanner producing [`Token`]s on demand
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer over the input
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    /// Current byte offset, for error reporting
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Produce the next token, or `None` at end of input
    pub fn next_token(&mut self) -> ParseResult<Option<Token<'input>>> {
        self.skip_whitespace();
        let Some(&byte) = self.bytes.get(self.pos) else {
            return Ok(None);
        };

        let token = match byte {
            b'#' => self.single(Token::Hash),
            b'+' => self.single(Token::Plus),
            b'-' => self.single(Token::Minus),
            b'*' => self.single(Token::Star),
            b'/' => self.single(Token::Slash),
            b'%' => self.single(Token::Percent),
            b'(' => self.single(Token::LeftParen),
            b')' => self.single(Token::RightParen),
            b',' => self.single(Token::Comma),
            b'.' => self.single(Token::Dot),
            b'=' => {
                if self.peek_next() == Some(b'=') {
                    self.pos += 2;
                    Token::EqualEqual
                } else {
                    return Err(ParseError::UnexpectedChar {
                        ch: '=',
                        position: self.pos,
                    });
                }
            }
            b'!' => {
                if self.peek_next() == Some(b'=') {
                    self.pos += 2;
                    Token::NotEqual
                } else {
                    self.single(Token::Not)
                }
            }
            b'<' => {
                if self.peek_next() == Some(b'=') {
                    self.pos += 2;
                    Token::LessThanOrEqual
                } else {
                    self.single(Token::LessThan)
                }
            }
            b'>' => {
                if self.peek_next() == Some(b'=') {
                    self.pos += 2;
                    Token::GreaterThanOrEqual
                } else {
                    self.single(Token::GreaterThan)
                }
            }
            b'&' => {
                if self.peek_next() == Some(b'&') {
                    self.pos += 2;
                    Token::And
                } else {
                    return Err(ParseError::UnexpectedChar {
                        ch: '&',
                        position: self.pos,
                    });
                }
            }
            b'|' => {
                if self.peek_next() == Some(b'|') {
                    self.pos += 2;
                    Token::Or
                } else {
                    return Err(ParseError::UnexpectedChar {
                        ch: '|',
                        position: self.pos,
                    });
                }
            }
            b'\'' | b'"' => self.scan_string(byte)?,
            b'0'..=b'9' => self.scan_number()?,
            b if b.is_ascii_alphabetic() || b == b'_' => self.scan_identifier(),
            _ => {
                let ch = self.input[self.pos..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(ParseError::UnexpectedChar {
                    ch,
                    position: self.pos,
                });
            }
        };

        Ok(Some(token))
    }

    fn single(&mut self, token: Token<'input>) -> Token<'input> {
        self.pos += 1;
        token
    }

    fn peek_next(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn scan_string(&mut self, quote: u8) -> ParseResult<Token<'input>> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'\\' {
                // Escape: skip the escaped byte as well
                self.pos += 2;
                continue;
            }
            if b == quote {
                let content = &self.input[content_start..self.pos];
                self.pos += 1;
                return Ok(Token::String(content));
            }
            self.pos += 1;
        }
        Err(ParseError::UnterminatedString { position: start })
    }

    fn scan_number(&mut self) -> ParseResult<Token<'input>> {
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }

        // A dot followed by a digit continues the literal as a decimal;
        // otherwise the dot belongs to property access.
        let is_decimal = self.bytes.get(self.pos) == Some(&b'.')
            && self
                .bytes
                .get(self.pos + 1)
                .is_some_and(|b| b.is_ascii_digit());
        if is_decimal {
            self.pos += 1;
            while self.bytes.get(self.pos).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
            return Ok(Token::Decimal(&self.input[start..self.pos]));
        }

        let text = &self.input[start..self.pos];
        text.parse::<i64>()
            .map(Token::Integer)
            .map_err(|_| ParseError::InvalidNumber {
                text: text.to_string(),
                position: start,
            })
    }

    fn scan_identifier(&mut self) -> Token<'input> {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos += 1;
        }
        match &self.input[start..self.pos] {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            name => Token::Identifier(name),
        }
    }
}
