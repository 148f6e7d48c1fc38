//! Recursive-descent parser for full boolean condition expressions.
//!
//! Where [`crate::parse::parse_conditions`] only splits a flat conjunction, this
//! parser understands `or`, `not` and parentheses:
//!
//! ```text
//! (actor.type == 'user' and not actor.roles.0 == 'guest') or actor.type == system
//! ```
//!
//! A run of `and` (or `or`) clauses becomes one n-ary node, so only
//! parentheses and `not` add depth, and both are capped at
//! [`MAX_NESTING_DEPTH`].
//!
//! Grammar (precedence: `not` > `and` > `or`):
//!   expr     = or_expr
//!   or_expr  = and_expr ( ('or' | '||') and_expr )*
//!   and_expr = unary ( ('and' | '&&') unary )*
//!   unary    = ('not' | '!') unary | atom
//!   atom     = '(' expr ')' | condition

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Level, instrument};

use crate::condition::{context_value, evaluate_condition_in};
use crate::error::PolicyParseError;
use crate::lexer::{LogicalOperator, TokenKind, tokenize};
use crate::parse::TokenParser;
use crate::rule::MAX_NESTING_DEPTH;
use crate::types::{DslPolicyContext, PolicyCondition};

/// A boolean tree over conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionExpr {
    Condition(PolicyCondition),
    /// Two or more operands, all of which must hold.
    And(Vec<ConditionExpr>),
    /// Two or more operands, at least one of which must hold.
    Or(Vec<ConditionExpr>),
    Not(Box<ConditionExpr>),
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionExpr::Condition(cond) => write!(f, "{}", cond),
            ConditionExpr::And(items) => write_joined(f, items, " and "),
            ConditionExpr::Or(items) => write_joined(f, items, " or "),
            ConditionExpr::Not(inner) => write!(f, "not {}", inner),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[ConditionExpr], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(")")
}

/// Parse a boolean expression over conditions.
#[instrument(level = Level::TRACE)]
pub fn parse_expression(text: &str) -> Result<ConditionExpr, PolicyParseError> {
    let tokens = tokenize(text)?;
    let mut parser = TokenParser::new(&tokens);
    let expr = parse_or(&mut parser, 0)?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Evaluate an expression tree against `context`. Short-circuits like `&&`/`||`.
pub fn evaluate_expression(expr: &ConditionExpr, context: &DslPolicyContext) -> bool {
    evaluate_in(expr, &context_value(context))
}

fn evaluate_in(expr: &ConditionExpr, root: &Value) -> bool {
    match expr {
        ConditionExpr::Condition(cond) => evaluate_condition_in(cond, root),
        ConditionExpr::And(items) => items.iter().all(|item| evaluate_in(item, root)),
        ConditionExpr::Or(items) => items.iter().any(|item| evaluate_in(item, root)),
        ConditionExpr::Not(inner) => !evaluate_in(inner, root),
    }
}

fn is_logical(parser: &TokenParser<'_>, op: LogicalOperator) -> bool {
    parser.peek().kind == TokenKind::Logical(op)
}

fn parse_or(parser: &mut TokenParser<'_>, depth: usize) -> Result<ConditionExpr, PolicyParseError> {
    let first = parse_and(parser, depth)?;
    if !is_logical(parser, LogicalOperator::Or) {
        return Ok(first);
    }
    let mut items = vec![first];
    while is_logical(parser, LogicalOperator::Or) {
        parser.advance();
        items.push(parse_and(parser, depth)?);
    }
    Ok(ConditionExpr::Or(items))
}

fn parse_and(parser: &mut TokenParser<'_>, depth: usize) -> Result<ConditionExpr, PolicyParseError> {
    let first = parse_unary(parser, depth)?;
    if !is_logical(parser, LogicalOperator::And) {
        return Ok(first);
    }
    let mut items = vec![first];
    while is_logical(parser, LogicalOperator::And) {
        parser.advance();
        items.push(parse_unary(parser, depth)?);
    }
    Ok(ConditionExpr::And(items))
}

fn parse_unary(
    parser: &mut TokenParser<'_>,
    depth: usize,
) -> Result<ConditionExpr, PolicyParseError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(parser.error("a shallower expression"));
    }
    if is_logical(parser, LogicalOperator::Not) {
        parser.advance();
        let inner = parse_unary(parser, depth + 1)?;
        return Ok(ConditionExpr::Not(Box::new(inner)));
    }
    parse_atom(parser, depth)
}

fn parse_atom(parser: &mut TokenParser<'_>, depth: usize) -> Result<ConditionExpr, PolicyParseError> {
    if parser.peek().kind == TokenKind::LParen {
        parser.advance();
        let expr = parse_or(parser, depth + 1)?;
        if parser.peek().kind != TokenKind::RParen {
            return Err(parser.error("closing ')'"));
        }
        parser.advance();
        return Ok(expr);
    }
    parser.condition().map(ConditionExpr::Condition)
}
