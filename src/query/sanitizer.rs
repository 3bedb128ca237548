//! Comment stripping for raw SQL text.
//!
//! This removes comments only. It is not an injection filter; use the
//! parameterized execution path for untrusted values.

use std::sync::LazyLock;

use regex::Regex;

use super::classifier::trim_sql;

/// `--` to end of line.
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[^\r\n]*").expect("line comment pattern is valid"));

/// Shortest `/* ... */` span, newlines included.
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern is valid"));

/// Removes line and block comments, then trims the result.
///
/// Line comments are stripped before block comments, so a `*/` that sits
/// inside a line comment does not close a block.
pub fn sanitize(sql: &str) -> String {
    let without_lines = LINE_COMMENT.replace_all(sql, "");
    let without_blocks = BLOCK_COMMENT.replace_all(&without_lines, "");
    trim_sql(&without_blocks).to_string()
}

/// Like [`sanitize`], mapping absent input to empty text.
pub fn sanitize_opt(sql: Option<&str>) -> String {
    sql.map(sanitize).unwrap_or_default()
}
