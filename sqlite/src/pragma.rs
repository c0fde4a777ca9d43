//! Typed access to the PRAGMA statements the database uses.
//!
//! Configuration pragmas (`foreign_keys`, `journal_mode`, `synchronous`)
//! are applied at open; introspection pragmas (`integrity_check`,
//! `table_info`, `foreign_key_list`, `foreign_key_check`, `user_version`)
//! are exposed as typed queries on [`Database`].
//!
//! [`Database`]: crate::db::Database

/// Journal modes.
///
/// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_journal_mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }

    /// Parses the value `PRAGMA journal_mode` reports.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "DELETE" => Some(JournalMode::Delete),
            "TRUNCATE" => Some(JournalMode::Truncate),
            "PERSIST" => Some(JournalMode::Persist),
            "MEMORY" => Some(JournalMode::Memory),
            "WAL" => Some(JournalMode::Wal),
            "OFF" => Some(JournalMode::Off),
            _ => None,
        }
    }
}

/// Synchronous modes.
///
/// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_synchronous)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronousMode {
    Off,
    Normal,
    Full,
    Extra,
}

impl SynchronousMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            SynchronousMode::Off => "OFF",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Full => "FULL",
            SynchronousMode::Extra => "EXTRA",
        }
    }

    /// Parses the numeric value `PRAGMA synchronous` reports.
    pub const fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(SynchronousMode::Off),
            1 => Some(SynchronousMode::Normal),
            2 => Some(SynchronousMode::Full),
            3 => Some(SynchronousMode::Extra),
            _ => None,
        }
    }
}

/// One row of `PRAGMA foreign_key_list(<table>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyInfo {
    pub id: i64,
    pub seq: i64,
    pub table: String,
    pub from: String,
    pub to: Option<String>,
    pub on_update: String,
    pub on_delete: String,
}

/// One row of `PRAGMA foreign_key_check(<table>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyViolation {
    pub table_name: String,
    pub row_id: Option<i64>,
    pub refers_to: String,
    pub failing_constraint_index: i64,
}

/// One row of `PRAGMA table_info(<table>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumnInfo {
    pub cid: i64,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: i64,
}

/// Renders the PRAGMA statements used by this crate.
pub(crate) struct Pragma;

impl Pragma {
    pub(crate) fn foreign_keys(on: bool) -> String {
        format!("PRAGMA foreign_keys = {}", if on { "ON" } else { "OFF" })
    }

    pub(crate) fn journal_mode(mode: JournalMode) -> String {
        format!("PRAGMA journal_mode = {}", mode.as_str())
    }

    pub(crate) fn synchronous(mode: SynchronousMode) -> String {
        format!("PRAGMA synchronous = {}", mode.as_str())
    }

    pub(crate) fn user_version() -> &'static str {
        "PRAGMA user_version"
    }

    pub(crate) fn set_user_version(version: i64) -> String {
        format!("PRAGMA user_version = {version}")
    }

    pub(crate) fn integrity_check(max_errors: u32) -> String {
        format!("PRAGMA integrity_check({max_errors})")
    }

    pub(crate) fn table_info(table: &str) -> String {
        format!("PRAGMA table_info({table})")
    }

    pub(crate) fn foreign_key_list(table: &str) -> String {
        format!("PRAGMA foreign_key_list({table})")
    }

    pub(crate) fn foreign_key_check(table: &str) -> String {
        format!("PRAGMA foreign_key_check({table})")
    }
}
