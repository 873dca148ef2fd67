//! Error types for license expression parsing

use thiserror::Error;

/// Result type alias using ParseError
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised while parsing an SPDX license expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was empty or whitespace only
    #[error("License expression is empty")]
    Empty,

    /// A character that cannot start any token
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    /// A token that is not valid at this point of the expression
    #[error("Unexpected '{token}' at position {position}, expected {expected}")]
    UnexpectedToken {
        token: String,
        position: usize,
        expected: &'static str,
    },

    /// Input ended while more was expected
    #[error("Unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    /// `(` without its matching `)`
    #[error("Unclosed parenthesis opened at position {position}")]
    UnclosedParenthesis { position: usize },

    /// `WITH` applied to something other than a single license
    #[error("WITH at position {position} must follow a single license identifier")]
    CompoundException { position: usize },

    /// Parentheses nested deeper than the parser accepts
    #[error("Parentheses nested deeper than {limit} levels at position {position}")]
    TooDeep { position: usize, limit: usize },

    /// More license identifiers than the parser accepts
    #[error("Expression has more than {limit} license identifiers, at position {position}")]
    TooManyTerms { position: usize, limit: usize },
}

impl ParseError {
    /// Byte offset of the error in the input, when known
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::UnexpectedCharacter { position, .. }
            | Self::UnexpectedToken { position, .. }
            | Self::UnclosedParenthesis { position }
            | Self::CompoundException { position }
            | Self::TooDeep { position, .. }
            | Self::TooManyTerms { position, .. } => Some(*position),
            Self::Empty | Self::UnexpectedEnd { .. } => None,
        }
    }
}
