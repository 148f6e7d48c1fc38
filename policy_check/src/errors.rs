//! User-facing error display.
//!
//! Prints an anyhow error with its causal chain and, when a
//! [`PolicyParseError`] is somewhere in the chain, its help hint.

use std::io::Write;

use policy_dsl::PolicyParseError;

use crate::style;

/// Write `err` to stderr.
///
/// Format:
///   error: top-level message
///     caused by: chain item
///
///   hint: actionable suggestion (if available)
///
/// Verbose mode appends the Debug representation of the whole chain.
pub fn display_error(err: &anyhow::Error, verbose: bool) {
    let mut stderr = std::io::stderr().lock();
    let _ = stderr.write_all(render(err, verbose).as_bytes());
}

fn render(err: &anyhow::Error, verbose: bool) -> String {
    let mut out = format!("{}: {}\n", style::err_red_bold("error"), err);

    let chain: Vec<_> = err.chain().skip(1).collect();
    if chain.len() == 1 {
        out += &format!("  {}\n", style::err_dim(&format!("caused by: {}", chain[0])));
    } else {
        for (i, cause) in chain.iter().enumerate() {
            out += &format!("  {}\n", style::err_dim(&format!("{}: {}", i + 1, cause)));
        }
    }

    if let Some(hint) = hint(err) {
        out += &format!("\n  {}: {}\n", style::err_cyan_bold("hint"), hint);
    }

    if verbose {
        out += &format!("\nFull error chain:\n{:?}\n", err);
    } else if !chain.is_empty() {
        out += &format!("\n  {}\n", style::err_dim("run with --verbose for full details"));
    }
    out
}

fn hint(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PolicyParseError>())
        .and_then(PolicyParseError::help)
}
