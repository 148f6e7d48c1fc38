//! Error types for lexing and parsing policy DSL text.
//!
//! Every variant carries the 1-based line and column where the problem was
//! found. Evaluation never produces these: only the text front end fails.

/// Error raised while tokenizing or parsing DSL text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyParseError {
    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },

    #[error("unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("invalid number '{literal}' at line {line}, column {column}")]
    InvalidNumber {
        literal: String,
        line: usize,
        column: usize,
    },

    #[error("expected {expected}, found {found} at line {line}, column {column}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("expected {expected}, found end of input at line {line}, column {column}")]
    UnexpectedEof {
        expected: String,
        line: usize,
        column: usize,
    },
}

impl PolicyParseError {
    /// Line and column (both 1-based) of the offending input.
    pub fn position(&self) -> (usize, usize) {
        match self {
            PolicyParseError::UnexpectedCharacter { line, column, .. }
            | PolicyParseError::UnterminatedString { line, column }
            | PolicyParseError::InvalidNumber { line, column, .. }
            | PolicyParseError::UnexpectedToken { line, column, .. }
            | PolicyParseError::UnexpectedEof { line, column, .. } => (*line, *column),
        }
    }

    /// Return a help message suggesting how to fix this error, if applicable.
    pub fn help(&self) -> Option<String> {
        match self {
            PolicyParseError::UnexpectedCharacter { ch: '=', .. } => {
                Some("use '==' for equality and '=>' for arrows".into())
            }
            PolicyParseError::UnexpectedCharacter { ch: '&' | '|', .. } => {
                Some("logical operators are '&&', '||', 'and', 'or'".into())
            }
            PolicyParseError::UnterminatedString { .. } => {
                Some("close the string with the same quote character that opened it".into())
            }
            PolicyParseError::InvalidNumber { literal, .. } => Some(format!(
                "numbers are digits with at most one '.' (got '{}')",
                literal
            )),
            PolicyParseError::UnexpectedToken { .. } | PolicyParseError::UnexpectedEof { .. } => {
                Some(
                    "expected format: 'field operator value', e.g. actor.type == \"user\" \
                     or resource.attributes.size > 10"
                        .into(),
                )
            }
            _ => None,
        }
    }
}
