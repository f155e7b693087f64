//! DDL text to schema conversion, plus statement splitting for executors.

mod parser;
mod scanner;

pub use parser::{ParseGap, ParseReport, parse_sql, parse_sql_with_report};

use scanner::Scanner;

/// Split a script into executable statements on top-level `;`.
///
/// Semicolons inside parentheses, quoted literals and comments do not
/// split. Fragments are trimmed and empty ones dropped, so leading or
/// trailing whitespace and blank lines never change the result.
pub fn split_statements(input: &str) -> Vec<String> {
    Scanner::new(input).split(';')
}
