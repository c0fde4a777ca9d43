//! The per-database statement registry.
//!
//! Compiled statements are keyed by their SQL text. Handle retention is
//! delegated to the connection's prepared-statement cache (sized well
//! above any schema-bounded statement set and released when the
//! connection closes); this registry carries each statement's positional
//! persistent types and the compile/reuse counters tests assert against.

use compact_str::CompactString;
use hashbrown::HashMap;
use welite_core::types::PersistentType;

#[derive(Debug)]
struct CacheEntry {
    types: Vec<PersistentType>,
    executions: u64,
}

/// Statement-cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Distinct statements compiled over the database lifetime.
    pub compiled: u64,
    /// Executions served by an already-compiled statement.
    pub reused: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatementCache {
    entries: HashMap<CompactString, CacheEntry>,
    stats: CacheStats,
}

impl StatementCache {
    /// Records a use of `sql`; returns true when this is its first
    /// compilation.
    pub(crate) fn note(&mut self, sql: &str, types: &[PersistentType]) -> bool {
        match self.entries.get_mut(sql) {
            Some(entry) => {
                entry.executions += 1;
                self.stats.reused += 1;
                false
            }
            None => {
                self.entries.insert(
                    CompactString::new(sql),
                    CacheEntry {
                        types: types.to_vec(),
                        executions: 1,
                    },
                );
                self.stats.compiled += 1;
                true
            }
        }
    }

    pub(crate) fn types_of(&self, sql: &str) -> Option<&[PersistentType]> {
        self.entries.get(sql).map(|e| e.types.as_slice())
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.stats
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
