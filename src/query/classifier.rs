//! Leading-keyword statement classification.
//!
//! A statement's kind is decided by its first keyword alone. The keyword
//! must be followed by whitespace, so `SELECT(1)` and `SELECTOR x` are both
//! `Unknown`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Minimum trimmed length of a statement accepted by [`is_valid_query`].
pub const MIN_QUERY_LEN: usize = 3;

/// Coarse kind of a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Unknown,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(keyword)
    }
}

/// Keyword patterns in priority order.
static PATTERNS: LazyLock<Vec<(StatementKind, Regex)>> = LazyLock::new(|| {
    [
        (StatementKind::Select, "SELECT"),
        (StatementKind::Insert, "INSERT"),
        (StatementKind::Update, "UPDATE"),
        (StatementKind::Delete, "DELETE"),
        (StatementKind::Create, "CREATE"),
        (StatementKind::Drop, "DROP"),
    ]
    .into_iter()
    .map(|(kind, keyword)| {
        let pattern = format!(r"(?i)^{keyword}[ \t\n\x0B\f\r]+");
        let regex = Regex::new(&pattern).expect("keyword patterns are valid");
        (kind, regex)
    })
    .collect()
});

/// Strips leading and trailing control characters and ASCII spaces.
///
/// Non-ASCII whitespace such as U+00A0 is kept, so `"\u{A0}SELECT 1"` is
/// not a SELECT.
pub(crate) fn trim_sql(sql: &str) -> &str {
    sql.trim_matches(|c: char| c <= ' ')
}

/// Classifies a statement by its leading keyword.
pub fn classify(sql: &str) -> StatementKind {
    let trimmed = trim_sql(sql);
    if trimmed.is_empty() {
        return StatementKind::Unknown;
    }

    PATTERNS
        .iter()
        .find(|(_, regex)| regex.is_match(trimmed))
        .map(|(kind, _)| *kind)
        .unwrap_or(StatementKind::Unknown)
}

/// Returns true if the statement is long enough and has a known kind.
pub fn is_valid_query(sql: &str) -> bool {
    let trimmed = trim_sql(sql);
    trimmed.chars().count() >= MIN_QUERY_LEN && classify(trimmed) != StatementKind::Unknown
}

/// Returns true if the statement only reads data.
pub fn is_read_only(sql: &str) -> bool {
    classify(sql) == StatementKind::Select
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_keyword() {
        let cases = [
            ("SELECT * FROM users", StatementKind::Select),
            ("INSERT INTO users (name) VALUES ('John')", StatementKind::Insert),
            ("UPDATE users SET name = 'Jane' WHERE id = 1", StatementKind::Update),
            ("DELETE FROM users WHERE id = 1", StatementKind::Delete),
            ("CREATE TABLE test (id INT)", StatementKind::Create),
            ("DROP TABLE test", StatementKind::Drop),
            ("INVALID QUERY", StatementKind::Unknown),
        ];

        for (sql, expected) in cases {
            assert_eq!(classify(sql), expected, "classify({sql:?})");
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("select 1"), StatementKind::Select);
        assert_eq!(classify("SELECT 1"), StatementKind::Select);
        assert_eq!(classify("SeLeCt 1"), StatementKind::Select);
        assert_eq!(classify("drop table x"), StatementKind::Drop);
    }

    #[test]
    fn test_classify_empty_and_blank() {
        assert_eq!(classify(""), StatementKind::Unknown);
        assert_eq!(classify("   "), StatementKind::Unknown);
        assert_eq!(classify("\n\t"), StatementKind::Unknown);
    }

    #[test]
    fn test_classify_requires_whitespace_after_keyword() {
        assert_eq!(classify("SELECTOR x"), StatementKind::Unknown);
        assert_eq!(classify("SELECT(1)"), StatementKind::Unknown);
        assert_eq!(classify("SELECT"), StatementKind::Unknown);
        assert_eq!(classify("SELECT\n1"), StatementKind::Select);
        assert_eq!(classify("SELECT\t*\tFROM t"), StatementKind::Select);
    }

    #[test]
    fn test_classify_ignores_surrounding_whitespace() {
        assert_eq!(classify("   \n  INSERT INTO t VALUES (1)  "), StatementKind::Insert);
    }

    #[test]
    fn test_classify_trims_only_control_and_space() {
        assert_eq!(classify("\u{1}SELECT 1"), StatementKind::Select);
        assert_eq!(classify("SELECT 1\u{0}"), StatementKind::Select);
        assert_eq!(classify("\u{A0}SELECT 1"), StatementKind::Unknown);
        assert_eq!(classify("\u{2003}DROP TABLE t"), StatementKind::Unknown);
        assert!(!is_valid_query("\u{A0}SELECT 1"));
        assert!(is_valid_query("\u{1f}DELETE FROM t"));
    }

    #[test]
    fn test_classify_leading_comment_is_unknown() {
        assert_eq!(classify("-- note\nSELECT 1"), StatementKind::Unknown);
    }

    #[test]
    fn test_is_valid_query() {
        assert!(is_valid_query("SELECT 1"));
        assert!(!is_valid_query(""));
        assert!(!is_valid_query("   "));
        assert!(!is_valid_query("INVALID QUERY"));
        assert!(!is_valid_query("ab"));
    }

    #[test]
    fn test_is_read_only() {
        assert!(is_read_only("select * from t"));
        assert!(!is_read_only("DELETE FROM t"));
        assert!(!is_read_only(""));
    }

    #[test]
    fn test_display() {
        assert_eq!(StatementKind::Select.to_string(), "SELECT");
        assert_eq!(StatementKind::Unknown.to_string(), "UNKNOWN");
    }
}
