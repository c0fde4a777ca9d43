//! Version migrations.
//!
//! A [`Migration`] carries the version span it covers and the steps that
//! perform it, run inside a transaction. [`find_migration_path`] picks the
//! smallest sequence of migrations covering a version gap, preferring the
//! widest span at each point.

use crate::error::Result;
use crate::txn::Transaction;

type MigrationFn = Box<dyn Fn(&mut Transaction<'_>) -> Result<()> + Send + Sync>;

/// One schema migration from `from_version` to `to_version`.
pub struct Migration {
    from_version: i64,
    to_version: i64,
    apply: MigrationFn,
}

impl Migration {
    pub fn new(
        from_version: i64,
        to_version: i64,
        apply: impl Fn(&mut Transaction<'_>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Migration {
            from_version,
            to_version,
            apply: Box::new(apply),
        }
    }

    #[inline]
    pub fn from_version(&self) -> i64 {
        self.from_version
    }

    #[inline]
    pub fn to_version(&self) -> i64 {
        self.to_version
    }

    pub(crate) fn run(&self, tx: &mut Transaction<'_>) -> Result<()> {
        (self.apply)(tx)
    }
}

impl core::fmt::Debug for Migration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Migration")
            .field("from_version", &self.from_version)
            .field("to_version", &self.to_version)
            .finish()
    }
}

/// The smallest migration sequence stepping `old` up to `new`: at each
/// version, the migration reaching furthest without overshooting wins.
/// `None` when the gap cannot be covered.
pub fn find_migration_path(
    migrations: &[Migration],
    old: i64,
    new: i64,
) -> Option<Vec<&Migration>> {
    if old >= new {
        return Some(Vec::new());
    }
    let mut path = Vec::new();
    let mut current = old;
    while current < new {
        let step = migrations
            .iter()
            .filter(|m| m.from_version == current && m.to_version <= new)
            .max_by_key(|m| m.to_version)?;
        if step.to_version <= current {
            return None;
        }
        path.push(step);
        current = step.to_version;
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migration(from: i64, to: i64) -> Migration {
        Migration::new(from, to, |_| Ok(()))
    }

    #[test]
    fn widest_span_wins() {
        let migrations = [
            migration(1, 2),
            migration(2, 3),
            migration(3, 4),
            migration(1, 3),
        ];
        let path = find_migration_path(&migrations, 1, 4).unwrap();
        let spans: Vec<(i64, i64)> = path
            .iter()
            .map(|m| (m.from_version(), m.to_version()))
            .collect();
        assert_eq!(spans, [(1, 3), (3, 4)]);
    }

    #[test]
    fn gap_without_coverage_is_none() {
        let migrations = [migration(1, 2), migration(3, 4)];
        assert!(find_migration_path(&migrations, 1, 4).is_none());
    }

    #[test]
    fn already_current_is_empty() {
        assert_eq!(find_migration_path(&[], 3, 3).unwrap().len(), 0);
    }

    #[test]
    fn overshooting_migrations_are_ignored() {
        let migrations = [migration(1, 5), migration(1, 2), migration(2, 3)];
        let path = find_migration_path(&migrations, 1, 3).unwrap();
        let spans: Vec<(i64, i64)> = path
            .iter()
            .map(|m| (m.from_version(), m.to_version()))
            .collect();
        assert_eq!(spans, [(1, 2), (2, 3)]);
    }
}
