//! SQL identifiers and quoting policy.
//!
//! An [`Identity`] carries the unquoted name of a schema object together
//! with the rule for when it must be double-quoted in generated SQL:
//! reserved words, names containing characters outside `[A-Za-z0-9_]`, and
//! names whose quoting was forced by the caller.

use compact_str::CompactString;
use core::fmt;

/// SQLite reserved words, sorted for binary search. Identifiers matching
/// one of these (case-insensitively) are always quoted.
const RESERVED_WORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHOUT",
];

fn is_reserved(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    RESERVED_WORDS.binary_search(&upper.as_str()).is_ok()
}

fn has_special_chars(name: &str) -> bool {
    name.is_empty()
        || name.chars().next().is_some_and(|c| c.is_ascii_digit())
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A SQL identifier with its quoting policy.
#[derive(Debug, Clone)]
pub struct Identity {
    name: CompactString,
    force_quote: bool,
}

impl Identity {
    /// Creates an identity quoted only when required (reserved word or
    /// special characters).
    pub fn new(name: impl AsRef<str>) -> Self {
        Identity {
            name: CompactString::new(name.as_ref()),
            force_quote: false,
        }
    }

    /// Creates an identity that is always quoted.
    pub fn forced(name: impl AsRef<str>) -> Self {
        Identity {
            name: CompactString::new(name.as_ref()),
            force_quote: true,
        }
    }

    /// The raw, unquoted name.
    #[inline]
    pub fn unquoted(&self) -> &str {
        &self.name
    }

    /// True when rendering must quote this identifier.
    pub fn needs_quoting(&self) -> bool {
        self.force_quote || is_reserved(&self.name) || has_special_chars(&self.name)
    }

    /// Appends the rendered identifier, quoting and doubling internal `"`
    /// when the policy requires it.
    pub fn push_to(&self, out: &mut String) {
        if self.needs_quoting() {
            out.push('"');
            for ch in self.name.chars() {
                if ch == '"' {
                    out.push('"');
                }
                out.push(ch);
            }
            out.push('"');
        } else {
            out.push_str(&self.name);
        }
    }

    /// The rendered identifier as a fresh string.
    pub fn rendered(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 2);
        self.push_to(&mut out);
        out
    }

    /// Joins two identities with `_`: `a + b == a_b`.
    pub fn join(&self, other: &Identity) -> Identity {
        let mut name = CompactString::with_capacity(self.name.len() + other.name.len() + 1);
        name.push_str(&self.name);
        name.push('_');
        name.push_str(&other.name);
        Identity {
            name,
            force_quote: self.force_quote || other.force_quote,
        }
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Identity {}

impl core::hash::Hash for Identity {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered())
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Identity::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_render_quoted_on_demand_only() {
        assert_eq!(Identity::new("Artist").rendered(), "Artist");
        assert_eq!(Identity::new("_id").rendered(), "_id");
    }

    #[test]
    fn reserved_words_are_quoted() {
        assert_eq!(Identity::new("Order").rendered(), "\"Order\"");
        assert_eq!(Identity::new("table").rendered(), "\"table\"");
        assert_eq!(Identity::new("WHERE").rendered(), "\"WHERE\"");
    }

    #[test]
    fn special_characters_force_quoting() {
        assert_eq!(Identity::new("media uri").rendered(), "\"media uri\"");
        assert_eq!(Identity::new("1st").rendered(), "\"1st\"");
        assert_eq!(Identity::new("a\"b").rendered(), "\"a\"\"b\"");
    }

    #[test]
    fn forced_always_quotes() {
        assert_eq!(Identity::forced("Artist").rendered(), "\"Artist\"");
    }

    #[test]
    fn join_concatenates_with_underscore() {
        let joined = Identity::new("Artist").join(&Identity::new("Album"));
        assert_eq!(joined.unquoted(), "Artist_Album");
    }

    #[test]
    fn reserved_word_table_is_sorted() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);
    }
}
