//! The database: open/close lifecycle, configuration, schema creation and
//! migration, and the read receiver.
//!
//! A [`Database`] owns one rusqlite connection, its statement registry,
//! and the transaction bookkeeping. All work happens on the thread that
//! opened the database unless [`OpenParams::allow_work_on_arbitrary_threads`]
//! relaxes the guard. Reads go through [`Database::query`]; writes and DDL
//! through [`Database::transaction`] and friends in [`crate::txn`].

use crate::bind::ArgBinder;
use crate::cache::{CacheStats, StatementCache};
use crate::cursor::{Cursor, Row};
use crate::error::{Error, Result};
use crate::master::sqlite_master;
use crate::migration::{Migration, find_migration_path};
use crate::pragma::{
    ForeignKeyInfo, ForeignKeyViolation, JournalMode, Pragma, SynchronousMode, TableColumnInfo,
};
use crate::token::CancellationToken;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::thread::{self, ThreadId};
use welite_core::builder::StatementSeed;
use welite_core::deps::TableDependencies;
use welite_core::expr::bind_arg;
use welite_core::query::{QueryBuilder, QuerySeed};
use welite_core::source::{
    CompoundSelect, Creatable, SchemaObjectKind, Table, View,
};
use welite_core::trigger::Trigger;

/// Prepared statements retained by the connection; comfortably above any
/// schema-bounded statement set.
const STATEMENT_CACHE_CAPACITY: usize = 256;

/// `CREATE VIEW` column-alias lists require SQLite 3.9.
const VIEW_ALIAS_MIN_VERSION: i32 = 3_009_000;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DbPath {
    #[default]
    Memory,
    File(PathBuf),
}

/// Lifecycle states of a database instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbState {
    Opening,
    Configured,
    Created,
    Migrated,
    Opened,
    Closed,
}

/// Open-time configuration.
pub struct OpenParams {
    pub(crate) path: DbPath,
    pub(crate) version: i64,
    pub(crate) enable_foreign_key_constraints: bool,
    pub(crate) enable_write_ahead_logging: bool,
    pub(crate) journal_mode: Option<JournalMode>,
    pub(crate) synchronous: Option<SynchronousMode>,
    pub(crate) allow_work_on_arbitrary_threads: bool,
    pub(crate) throw_if_no_choice: bool,
    pub(crate) migration_required: bool,
    pub(crate) lifecycle: Lifecycle,
}

impl OpenParams {
    pub fn in_memory() -> Self {
        OpenParams {
            path: DbPath::Memory,
            version: 1,
            enable_foreign_key_constraints: true,
            enable_write_ahead_logging: false,
            journal_mode: None,
            synchronous: None,
            allow_work_on_arbitrary_threads: false,
            throw_if_no_choice: true,
            migration_required: false,
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        let mut params = Self::in_memory();
        params.path = DbPath::File(path.into());
        params
    }

    pub fn version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// `PRAGMA foreign_keys` at open.
    pub fn enable_foreign_key_constraints(mut self, on: bool) -> Self {
        self.enable_foreign_key_constraints = on;
        self
    }

    /// Write-ahead logging; shorthand for `journal_mode(Wal)`.
    pub fn enable_write_ahead_logging(mut self, on: bool) -> Self {
        self.enable_write_ahead_logging = on;
        self
    }

    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = Some(mode);
        self
    }

    pub fn synchronous_mode(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = Some(mode);
        self
    }

    /// Relaxes the owning-thread assertion.
    pub fn allow_work_on_arbitrary_threads(mut self, allow: bool) -> Self {
        self.allow_work_on_arbitrary_threads = allow;
        self
    }

    /// Whether closing an unmarked transaction is an error (it always
    /// rolls back).
    pub fn throw_if_no_choice(mut self, throw: bool) -> Self {
        self.throw_if_no_choice = throw;
        self
    }

    /// Fail with [`Error::MigrationMissing`] instead of dropping and
    /// recreating when no migration path covers the version gap.
    pub fn require_migration(mut self, required: bool) -> Self {
        self.migration_required = required;
        self
    }

    pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

type LifecycleFn = Box<dyn Fn(&Database) -> Result<()>>;

/// Optional open-lifecycle callbacks.
#[derive(Default)]
pub struct Lifecycle {
    pub on_configure: Option<LifecycleFn>,
    pub on_create: Option<LifecycleFn>,
    pub on_open: Option<LifecycleFn>,
    /// Invoked when the database reports corruption; the default closes
    /// the database and deletes the file.
    pub on_corruption: Option<LifecycleFn>,
}

impl Lifecycle {
    pub fn on_configure(mut self, f: impl Fn(&Database) -> Result<()> + 'static) -> Self {
        self.on_configure = Some(Box::new(f));
        self
    }

    pub fn on_create(mut self, f: impl Fn(&Database) -> Result<()> + 'static) -> Self {
        self.on_create = Some(Box::new(f));
        self
    }

    pub fn on_open(mut self, f: impl Fn(&Database) -> Result<()> + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    pub fn on_corruption(mut self, f: impl Fn(&Database) -> Result<()> + 'static) -> Self {
        self.on_corruption = Some(Box::new(f));
        self
    }
}

/// The declared schema a database creates and migrates toward.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub triggers: Vec<Trigger>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }
}

type CommitCallback = Box<dyn FnOnce() + Send>;

/// An open SQLite database with its statement registry and transaction
/// bookkeeping.
pub struct Database {
    conn: RefCell<Option<rusqlite::Connection>>,
    cache: RefCell<StatementCache>,
    owner: ThreadId,
    path: DbPath,
    allow_foreign_threads: bool,
    pub(crate) throw_if_no_choice: bool,
    state: Cell<DbState>,
    pub(crate) txn_depth: Cell<u32>,
    pub(crate) txn_rolled_back: Cell<bool>,
    pub(crate) pending_commit_callbacks: RefCell<Vec<CommitCallback>>,
}

impl Database {
    /// Opens (or creates) the database, applies configuration, and drives
    /// the create/migrate lifecycle against the declared schema.
    pub fn open(params: OpenParams, schema: &Schema, migrations: &[Migration]) -> Result<Database> {
        let conn = match &params.path {
            DbPath::Memory => rusqlite::Connection::open_in_memory()?,
            DbPath::File(path) => rusqlite::Connection::open(path)?,
        };
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);

        let db = Database {
            conn: RefCell::new(Some(conn)),
            cache: RefCell::new(StatementCache::default()),
            owner: thread::current().id(),
            path: params.path.clone(),
            allow_foreign_threads: params.allow_work_on_arbitrary_threads,
            throw_if_no_choice: params.throw_if_no_choice,
            state: Cell::new(DbState::Opening),
            txn_depth: Cell::new(0),
            txn_rolled_back: Cell::new(false),
            pending_commit_callbacks: RefCell::new(Vec::new()),
        };

        if let Some(on_configure) = &params.lifecycle.on_configure {
            on_configure(&db)?;
        }
        db.apply_configuration(&params)?;
        db.state.set(DbState::Configured);

        let current = db.user_version()?;
        if current == 0 {
            db.create_declared_schema(schema)?;
            db.set_user_version(params.version)?;
            if let Some(on_create) = &params.lifecycle.on_create {
                on_create(&db)?;
            }
            db.state.set(DbState::Created);
        } else if current < params.version {
            db.migrate(&params, schema, migrations, current)?;
            db.state.set(DbState::Migrated);
        }

        if let Some(on_open) = &params.lifecycle.on_open {
            on_open(&db)?;
        }
        db.state.set(DbState::Opened);
        Ok(db)
    }

    fn apply_configuration(&self, params: &OpenParams) -> Result<()> {
        self.exec_ddl(&Pragma::foreign_keys(params.enable_foreign_key_constraints))?;
        let journal = params.journal_mode.or(if params.enable_write_ahead_logging {
            Some(JournalMode::Wal)
        } else {
            None
        });
        if let Some(mode) = journal {
            // journal_mode reports its result as a row; run as a query.
            let _ = self.pragma_rows(&Pragma::journal_mode(mode), |row| {
                row.get::<_, String>(0)
            })?;
        }
        if let Some(mode) = params.synchronous {
            self.exec_ddl(&Pragma::synchronous(mode))?;
        }
        Ok(())
    }

    fn migrate(
        &self,
        params: &OpenParams,
        schema: &Schema,
        migrations: &[Migration],
        current: i64,
    ) -> Result<()> {
        match find_migration_path(migrations, current, params.version) {
            Some(path) => {
                for migration in path {
                    tracing::info!(
                        from = migration.from_version(),
                        to = migration.to_version(),
                        "running migration"
                    );
                    self.auto_commit("migration", |tx| migration.run(tx))?;
                    self.set_user_version(migration.to_version())?;
                }
                Ok(())
            }
            None if params.migration_required => {
                let error = Error::MigrationMissing {
                    from: current,
                    to: params.version,
                };
                let _ = self.close();
                Err(error)
            }
            None => {
                tracing::info!(
                    from = current,
                    to = params.version,
                    "no migration path; dropping and recreating schema"
                );
                self.drop_all_objects(params.enable_foreign_key_constraints)?;
                self.exec_ddl("VACUUM")?;
                let report = self.integrity_check(100)?;
                if report != ["ok"] {
                    return self.handle_corruption(params, report);
                }
                self.create_declared_schema(schema)?;
                self.set_user_version(params.version)
            }
        }
    }

    fn handle_corruption<T>(&self, params: &OpenParams, report: Vec<String>) -> Result<T> {
        tracing::error!(?report, "database integrity check failed");
        if let Some(on_corruption) = &params.lifecycle.on_corruption {
            on_corruption(self)?;
        } else {
            let _ = self.close();
            if let DbPath::File(path) = &self.path {
                let _ = std::fs::remove_file(path);
            }
        }
        Err(Error::Engine(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CORRUPT),
            Some("integrity check failed".into()),
        )))
    }

    /// Creates every declared object: tables in dependency order (with
    /// their indices), then views and triggers. A table failure aborts;
    /// failures on other creatables are logged and skipped.
    fn create_declared_schema(&self, schema: &Schema) -> Result<()> {
        let ordered = TableDependencies::new(schema.tables.iter().cloned())
            .tables_in_create_order()
            .map_err(Error::from)?;
        self.auto_commit("onCreate", |tx| {
            for table in &ordered {
                tx.create_table(table)?;
            }
            for view in &schema.views {
                if let Err(error) = tx.create_view(view) {
                    tracing::error!(view = view.name(), %error, "create view failed");
                }
            }
            for trigger in &schema.triggers {
                if let Err(error) = tx.create(trigger) {
                    tracing::error!(trigger = trigger.name(), %error, "create trigger failed");
                }
            }
            Ok(())
        })
    }

    /// Drops every user object recorded in `sqlite_master`, triggers and
    /// views before tables, with foreign keys disabled for the duration.
    fn drop_all_objects(&self, restore_foreign_keys: bool) -> Result<()> {
        let master = sqlite_master();
        let query = master
            .table
            .select((&master.object_type, &master.name))
            .where_(
                master
                    .name
                    .not_like("sqlite_%")
                    .and(master.object_type.in_list([
                        "table".to_owned(),
                        "index".to_owned(),
                        "view".to_owned(),
                        "trigger".to_owned(),
                    ])),
            );
        let objects: Vec<(String, String)> = self.query(|q| {
            q.rows(&query, crate::bind::no_args, |row| {
                Ok((row.get_string(0)?, row.get_string(1)?))
            })
        })?;

        self.exec_ddl(&Pragma::foreign_keys(false))?;
        let drop_outcome = self.auto_commit("dropAll", |tx| {
            for kind in ["trigger", "view", "table"] {
                for (object_kind, name) in &objects {
                    if object_kind == kind {
                        let mut sql = format!("DROP {} IF EXISTS ", kind.to_ascii_uppercase());
                        welite_core::identity::Identity::forced(name).push_to(&mut sql);
                        tx.exec_raw(&sql)?;
                    }
                }
            }
            Ok(())
        });
        self.exec_ddl(&Pragma::foreign_keys(restore_foreign_keys))?;
        drop_outcome
    }

    // ==================== receivers ====================

    /// Runs read-only work against the database. No transaction is
    /// opened; SQLite's auto-commit read semantics apply.
    pub fn query<R>(&self, f: impl FnOnce(&Queries<'_>) -> Result<R>) -> Result<R> {
        self.query_with_token(None, f)
    }

    /// [`Database::query`] with a cancellation token checked between
    /// rows.
    pub fn query_with_token<R>(
        &self,
        token: Option<CancellationToken>,
        f: impl FnOnce(&Queries<'_>) -> Result<R>,
    ) -> Result<R> {
        self.guard()?;
        if let Some(token) = &token {
            token.ensure_active()?;
        }
        f(&Queries { db: self, token })
    }

    // ==================== state & guards ====================

    #[inline]
    pub fn state(&self) -> DbState {
        self.state.get()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.get() != DbState::Closed
    }

    /// Statement-registry counters.
    pub fn statement_cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    pub(crate) fn guard(&self) -> Result<()> {
        if self.state.get() == DbState::Closed {
            return Err(Error::Closed);
        }
        if !self.allow_foreign_threads && thread::current().id() != self.owner {
            return Err(Error::WrongThread);
        }
        Ok(())
    }

    /// Closes the database: releases every compiled statement, then the
    /// connection. Idempotent.
    pub fn close(&self) -> Result<()> {
        if self.state.get() == DbState::Closed {
            return Ok(());
        }
        let mut slot = self
            .conn
            .try_borrow_mut()
            .map_err(|_| Error::transaction_state("close() during an active operation"))?;
        self.cache.borrow_mut().clear();
        if let Some(conn) = slot.take() {
            if let Err((conn, error)) = conn.close() {
                *slot = Some(conn);
                return Err(error.into());
            }
        }
        self.state.set(DbState::Closed);
        Ok(())
    }

    // ==================== engine access ====================

    pub(crate) fn with_conn<R>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> Result<R>,
    ) -> Result<R> {
        let guard = self.conn.borrow();
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        f(conn)
    }

    /// Direct execution for DDL and pragmas; bypasses the statement
    /// registry.
    pub(crate) fn exec_ddl(&self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "exec");
        self.with_conn(|conn| conn.execute_batch(sql).map_err(Into::into))
    }

    pub(crate) fn run_insert(
        &self,
        seed: &StatementSeed,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        token: Option<&CancellationToken>,
    ) -> Result<i64> {
        self.run_statement(seed, bind, token)?;
        self.with_conn(|conn| Ok(conn.last_insert_rowid()))
    }

    pub(crate) fn run_update_delete(
        &self,
        seed: &StatementSeed,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        token: Option<&CancellationToken>,
    ) -> Result<usize> {
        self.run_statement(seed, bind, token)
    }

    fn run_statement(
        &self,
        seed: &StatementSeed,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        token: Option<&CancellationToken>,
    ) -> Result<usize> {
        self.guard()?;
        if let Some(token) = token {
            token.ensure_active()?;
        }
        self.cache.borrow_mut().note(&seed.sql, &seed.types);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&seed.sql)?;
            stmt.clear_bindings();
            {
                let mut binder = ArgBinder::new(&mut stmt, &seed.types);
                bind(&mut binder)?;
            }
            stmt.raw_execute().map_err(Into::into)
        })
    }

    pub(crate) fn object_exists(&self, kind: SchemaObjectKind, name: &str) -> Result<bool> {
        let master = sqlite_master();
        let count_query = master.table.select_count(Some(
            master
                .object_type
                .eq(bind_arg::<String>())
                .and(master.name.eq(bind_arg::<String>())),
        ));
        let seed = count_query.seed()?;
        let kind = kind.as_str().to_owned();
        let name = name.to_owned();
        let count = self.query(|q| {
            q.seed_first(&seed, move |binder| {
                binder.set(0, kind)?;
                binder.set(1, name)?;
                Ok(())
            }, |row| row.get_i64(0))
        })?;
        Ok(count.unwrap_or(0) > 0)
    }

    /// True when the object is recorded in `sqlite_master`.
    pub fn exists(&self, object: &dyn Creatable) -> Result<bool> {
        self.object_exists(object.kind(), object.identity().unquoted())
    }

    // ==================== pragmas ====================

    fn pragma_rows<R>(
        &self,
        sql: &str,
        f: impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
    ) -> Result<Vec<R>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], f)?;
            rows.collect::<rusqlite::Result<Vec<R>>>().map_err(Into::into)
        })
    }

    pub(crate) fn user_version(&self) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row(Pragma::user_version(), [], |row| row.get(0))
                .map_err(Into::into)
        })
    }

    pub(crate) fn set_user_version(&self, version: i64) -> Result<()> {
        self.exec_ddl(&Pragma::set_user_version(version))
    }

    /// `PRAGMA integrity_check(<max_errors>)`; `["ok"]` when healthy.
    pub fn integrity_check(&self, max_errors: u32) -> Result<Vec<String>> {
        self.pragma_rows(&Pragma::integrity_check(max_errors), |row| row.get(0))
    }

    /// `PRAGMA foreign_key_list(<table>)`.
    pub fn foreign_key_list(&self, table: &Table) -> Result<Vec<ForeignKeyInfo>> {
        self.pragma_rows(&Pragma::foreign_key_list(table.name()), |row| {
            Ok(ForeignKeyInfo {
                id: row.get(0)?,
                seq: row.get(1)?,
                table: row.get(2)?,
                from: row.get(3)?,
                to: row.get(4)?,
                on_update: row.get(5)?,
                on_delete: row.get(6)?,
            })
        })
    }

    /// `PRAGMA foreign_key_check(<table>)`; empty when consistent.
    pub fn foreign_key_check(&self, table: &Table) -> Result<Vec<ForeignKeyViolation>> {
        self.pragma_rows(&Pragma::foreign_key_check(table.name()), |row| {
            Ok(ForeignKeyViolation {
                table_name: row.get(0)?,
                row_id: row.get(1)?,
                refers_to: row.get(2)?,
                failing_constraint_index: row.get(3)?,
            })
        })
    }

    /// `PRAGMA table_info(<table>)`.
    pub fn table_info(&self, table_name: &str) -> Result<Vec<TableColumnInfo>> {
        self.pragma_rows(&Pragma::table_info(table_name), |row| {
            Ok(TableColumnInfo {
                cid: row.get(0)?,
                name: row.get(1)?,
                type_name: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                default_value: row.get(4)?,
                primary_key: row.get(5)?,
            })
        })
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl core::fmt::Debug for Database {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("state", &self.state.get())
            .finish()
    }
}

/// The read receiver: typed query execution with lazy cursors.
pub struct Queries<'db> {
    pub(crate) db: &'db Database,
    pub(crate) token: Option<CancellationToken>,
}

impl Queries<'_> {
    /// Runs the query and maps every row.
    pub fn rows<R>(
        &self,
        query: &QueryBuilder,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        f: impl FnMut(&Row<'_>) -> Result<R>,
    ) -> Result<Vec<R>> {
        let seed = query.seed()?;
        self.seed_rows(&seed, bind, f)
    }

    /// Runs a pre-built seed and maps every row.
    pub fn seed_rows<R>(
        &self,
        seed: &QuerySeed,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        mut f: impl FnMut(&Row<'_>) -> Result<R>,
    ) -> Result<Vec<R>> {
        let mut out = Vec::new();
        self.with_cursor(seed, bind, |cursor| {
            while let Some(row) = cursor.next()? {
                out.push(f(&row)?);
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Runs the query for side effects per row.
    pub fn for_each(
        &self,
        query: &QueryBuilder,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        mut f: impl FnMut(&Row<'_>) -> Result<()>,
    ) -> Result<()> {
        let seed = query.seed()?;
        self.with_cursor(&seed, bind, |cursor| {
            while let Some(row) = cursor.next()? {
                f(&row)?;
            }
            Ok(())
        })
    }

    /// The first row, mapped; `None` on an empty result.
    pub fn first<R>(
        &self,
        query: &QueryBuilder,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        f: impl FnOnce(&Row<'_>) -> Result<R>,
    ) -> Result<Option<R>> {
        let seed = query.seed()?;
        self.seed_first(&seed, bind, f)
    }

    pub(crate) fn seed_first<R>(
        &self,
        seed: &QuerySeed,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        f: impl FnOnce(&Row<'_>) -> Result<R>,
    ) -> Result<Option<R>> {
        let mut f = Some(f);
        let mut out = None;
        self.with_cursor(seed, bind, |cursor| {
            if let Some(row) = cursor.next()? {
                if let Some(f) = f.take() {
                    out = Some(f(&row)?);
                }
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Opens a cursor over the query for manual iteration.
    pub fn with_cursor<R>(
        &self,
        seed: &QuerySeed,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        f: impl FnOnce(&mut Cursor<'_, '_>) -> Result<R>,
    ) -> Result<R> {
        self.db.guard()?;
        if let Some(token) = &self.token {
            token.ensure_active()?;
        }
        self.db.cache.borrow_mut().note(&seed.sql, &seed.types);
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&seed.sql)?;
            stmt.clear_bindings();
            {
                let mut binder = ArgBinder::new(&mut stmt, &seed.types);
                bind(&mut binder)?;
            }
            let rows = stmt.raw_query();
            let mut cursor = Cursor::new(rows, &seed.columns, self.token.clone());
            f(&mut cursor)
        })
    }

    /// `COUNT(*)` over the query, honouring the count-reuse policy.
    pub fn count(
        &self,
        query: &QueryBuilder,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<i64> {
        let seed = query.count_seed()?;
        self.scalar_i64(&seed, bind)
    }

    /// `COUNT(*)` over a compound select.
    pub fn count_compound(
        &self,
        compound: &CompoundSelect,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<i64> {
        let seed = compound.count_seed()?;
        self.scalar_i64(&seed, bind)
    }

    /// The first column of the first row as an integer; 0 on an empty
    /// result.
    pub fn scalar_i64(
        &self,
        seed: &StatementSeed,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<i64> {
        self.db.guard()?;
        self.db.cache.borrow_mut().note(&seed.sql, &seed.types);
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&seed.sql)?;
            stmt.clear_bindings();
            {
                let mut binder = ArgBinder::new(&mut stmt, &seed.types);
                bind(&mut binder)?;
            }
            let mut rows = stmt.raw_query();
            match rows.next()? {
                Some(row) => row.get::<_, i64>(0).map_err(Into::into),
                None => Ok(0),
            }
        })
    }

    /// The stored SQL of a schema object, read back from
    /// `sqlite_master`.
    pub fn object_sql(&self, kind: SchemaObjectKind, name: &str) -> Result<Option<String>> {
        let master = sqlite_master();
        let query = master.table.select(&master.sql).where_(
            master
                .object_type
                .eq(bind_arg::<String>())
                .and(master.name.eq(bind_arg::<String>())),
        );
        let seed = query.seed()?;
        let kind = kind.as_str().to_owned();
        let name = name.to_owned();
        let found = self.seed_first(
            &seed,
            move |binder| {
                binder.set(0, kind)?;
                binder.set(1, name)?;
                Ok(())
            },
            |row| row.get::<Option<String>>(0),
        )?;
        Ok(found.flatten())
    }
}

/// Whether the linked SQLite supports `CREATE VIEW (col, ...)` lists.
pub(crate) fn view_aliases_supported() -> bool {
    rusqlite::version_number() >= VIEW_ALIAS_MIN_VERSION
}
