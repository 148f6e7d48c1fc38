//! Condition parser: `field operator value` text into [`PolicyCondition`]s.
//!
//! `parse_conditions` is a flat splitter on `and` / `&&`. It does not know
//! about parentheses, `or`, or quoting, so `name == 'salt and pepper'` is split
//! in the middle of the string. Use [`crate::expr::parse_expression`] for
//! anything beyond a plain conjunction.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{Level, instrument};

use crate::error::PolicyParseError;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::types::{ConditionOperator, PolicyCondition};

/// Parse exactly one `field operator value` condition.
///
/// The field must be an identifier and the operator an operator token. The
/// value may be a string, number, boolean, or bare word (read as a string).
/// `exists` may omit its value, and `in`/`nin` also accept a parenthesized
/// list: `actor.type in (user, system)`.
#[instrument(level = Level::TRACE)]
pub fn parse_condition(text: &str) -> Result<PolicyCondition, PolicyParseError> {
    let tokens = tokenize(text)?;
    let mut parser = TokenParser::new(&tokens);
    let condition = parser.condition()?;
    parser.expect_eof()?;
    Ok(condition)
}

/// Parse a conjunction of conditions separated by `and` or `&&`.
///
/// Blank input yields no conditions. Any segment that fails to parse fails the
/// whole call; an empty segment (`a == 1 and`, `&& b == 2`) is reported as a
/// missing condition at the position where it should start.
#[instrument(level = Level::TRACE)]
pub fn parse_conditions(text: &str) -> Result<Vec<PolicyCondition>, PolicyParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut conditions = Vec::new();
    let mut start = 0;
    let separators = and_splitter()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .chain(std::iter::once((text.len(), text.len())));
    for (end, next) in separators {
        let segment = text[start..end].trim();
        if segment.is_empty() {
            let (line, column) = position_at(text, start);
            return Err(PolicyParseError::UnexpectedEof {
                expected: "condition".to_string(),
                line,
                column,
            });
        }
        conditions.push(parse_condition(segment)?);
        start = next;
    }
    Ok(conditions)
}

/// 1-based line and column of byte offset `offset` in `text`.
fn position_at(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |last| last.chars().count())
        + 1;
    (line, column)
}

fn and_splitter() -> &'static Regex {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    SPLITTER.get_or_init(|| Regex::new(r"(?i)\s+and(?:\s+|$)|\s*&&\s*").unwrap())
}

/// Cursor over a token stream, shared by the condition and expression parsers.
pub(crate) struct TokenParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenParser<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The current token. The lexer always emits a trailing `Eof`, which is
    /// never consumed, so this stays in bounds.
    pub(crate) fn peek(&self) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    pub(crate) fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn error(&self, expected: &str) -> PolicyParseError {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => PolicyParseError::UnexpectedEof {
                expected: expected.to_string(),
                line: token.line,
                column: token.column,
            },
            ref found => PolicyParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
                line: token.line,
                column: token.column,
            },
        }
    }

    pub(crate) fn expect_eof(&self) -> Result<(), PolicyParseError> {
        match self.peek().kind {
            TokenKind::Eof => Ok(()),
            _ => Err(self.error("end of input")),
        }
    }

    pub(crate) fn condition(&mut self) -> Result<PolicyCondition, PolicyParseError> {
        let field = match &self.peek().kind {
            TokenKind::Identifier(name) => name.clone(),
            _ => return Err(self.error("field name")),
        };
        self.advance();

        let operator = match self.peek().kind {
            TokenKind::Operator(op) => op,
            _ => return Err(self.error("operator")),
        };
        self.advance();

        let value = match (operator, &self.peek().kind) {
            (
                ConditionOperator::Exists,
                TokenKind::Eof | TokenKind::Logical(_) | TokenKind::RParen,
            ) => Value::Null,
            (ConditionOperator::In | ConditionOperator::Nin, TokenKind::LParen) => self.list()?,
            _ => self.literal()?,
        };

        Ok(PolicyCondition {
            field,
            operator: Some(operator),
            value,
        })
    }

    fn literal(&mut self) -> Result<Value, PolicyParseError> {
        let value = match &self.peek().kind {
            TokenKind::String(s) | TokenKind::Identifier(s) => Value::String(s.clone()),
            TokenKind::Number(n) => Value::Number(n.clone()),
            TokenKind::Boolean(b) => Value::Bool(*b),
            _ => return Err(self.error("value")),
        };
        self.advance();
        Ok(value)
    }

    /// `( literal (, literal)* )` or `()`.
    fn list(&mut self) -> Result<Value, PolicyParseError> {
        self.advance(); // '('
        let mut items = Vec::new();
        if self.peek().kind == TokenKind::RParen {
            self.advance();
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.literal()?);
            match self.peek().kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    return Ok(Value::Array(items));
                }
                _ => return Err(self.error("',' or ')'")),
            }
        }
    }
}
