//! In-memory query history.
//!
//! Records the outcome of every executed statement in a bounded log. Entries
//! are evicted oldest-first once the cap is exceeded; history ids keep
//! increasing across evictions and are only reset by [`HistoryTracker::clear`].

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::query::QueryResult;

/// Characters of SQL shown by the `Display` form of an entry.
const DISPLAY_SQL_CHARS: usize = 50;

/// One recorded execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub history_id: i64,
    pub conn_id: i64,
    pub sql: String,
    pub run_at: DateTime<Local>,
    pub duration_ms: u64,
    pub success: bool,
    /// Empty on success.
    pub error_message: String,
    /// Zero on failure.
    pub row_count: usize,
}

impl HistoryEntry {
    fn from_result(history_id: i64, conn_id: i64, result: &QueryResult) -> Self {
        Self {
            history_id,
            conn_id,
            sql: result.sql().to_string(),
            run_at: result.executed_at(),
            duration_ms: result.elapsed_ms(),
            success: result.is_success(),
            error_message: result.error_message().unwrap_or_default().to_string(),
            row_count: result.row_count(),
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sql = if self.sql.chars().count() > DISPLAY_SQL_CHARS {
            let head: String = self.sql.chars().take(DISPLAY_SQL_CHARS).collect();
            format!("{head}...")
        } else {
            self.sql.clone()
        };

        write!(
            f,
            "[{}] {} ({}ms, {} rows)",
            self.run_at.format("%Y-%m-%d %H:%M:%S"),
            sql,
            self.duration_ms,
            self.row_count
        )
    }
}

/// Bounded, append-only log of executed statements.
#[derive(Debug)]
pub struct HistoryTracker {
    entries: VecDeque<HistoryEntry>,
    next_id: i64,
    max_entries: usize,
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryTracker {
    /// Creates an empty tracker holding at most 100 entries.
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_HISTORY_LIMIT)
    }

    /// Creates an empty tracker with a custom cap. A cap of zero is raised to one.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 1,
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Appends an entry for `result` and returns its history id.
    pub fn record(&mut self, conn_id: i64, result: &QueryResult) -> i64 {
        let history_id = self.next_id;
        self.next_id += 1;

        self.entries
            .push_back(HistoryEntry::from_result(history_id, conn_id, result));

        if self.entries.len() > self.max_entries {
            if let Some(evicted) = self.entries.pop_front() {
                debug!("Evicted history entry #{}", evicted.history_id);
            }
        }

        history_id
    }

    /// All entries, oldest first.
    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Entries recorded for one connection, oldest first.
    pub fn for_connection(&self, conn_id: i64) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.conn_id == conn_id)
            .cloned()
            .collect()
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Entries whose SQL contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<HistoryEntry> {
        let needle = term.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.sql.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn by_id(&self, history_id: i64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.history_id == history_id)
    }

    /// Empties the log and restarts ids at 1.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
