//! `parse` and `tokens`: look at how condition text is understood.

use anyhow::{Context, Result};
use policy_dsl::{Token, parse_conditions, parse_expression, tokenize};
use tracing::{Level, instrument};

use crate::exit_code;
use crate::style;

/// Print the parsed form of `text` as JSON: a list of conditions, or with
/// `expr` a boolean expression tree.
#[instrument(level = Level::TRACE)]
pub fn parse(text: &str, expr: bool) -> Result<u8> {
    let json = if expr {
        let tree = parse_expression(text).context("failed to parse expression")?;
        serde_json::to_string_pretty(&tree)?
    } else {
        let conditions = parse_conditions(text).context("failed to parse conditions")?;
        serde_json::to_string_pretty(&conditions)?
    };
    println!("{json}");
    Ok(exit_code::SUCCESS)
}

#[instrument(level = Level::TRACE)]
pub fn tokens(text: &str) -> Result<u8> {
    let tokens = tokenize(text).context("failed to tokenize")?;
    print!("{}", token_listing(&tokens));
    Ok(exit_code::SUCCESS)
}

fn token_listing(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| {
            let pos = format!("{}:{}", t.line, t.column);
            format!("{:<8}{}\n", style::dim(&pos), t.kind)
        })
        .collect()
}
