//! Parse error types

use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors produced while tokenizing or parsing expression text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A character the tokenizer does not recognize
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar {
        /// The offending character
        ch: char,
        /// Byte offset in the input
        position: usize,
    },

    /// A string literal without a closing quote
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote
        position: usize,
    },

    /// A numeric literal that does not parse
    #[error("invalid number '{text}' at position {position}")]
    InvalidNumber {
        /// The literal text
        text: String,
        /// Byte offset in the input
        position: usize,
    },

    /// A token that does not fit the grammar at this point
    #[error("unexpected token {found} at position {position}, expected {expected}")]
    UnexpectedToken {
        /// Description of the found token
        found: String,
        /// Description of what was expected
        expected: String,
        /// Byte offset in the input
        position: usize,
    },

    /// Input ended while more tokens were required
    #[error("unexpected end of expression")]
    UnexpectedEof,
}
