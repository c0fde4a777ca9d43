//! SQL text assembly with a parallel placeholder-type list.
//!
//! [`SqlBuilder`] is an append-only buffer; every `?` emitted through
//! [`SqlBuilder::register_bindable`] records the persistent type of the
//! argument that will later fill the slot, so a finished statement carries
//! `(sql, types)` with `types.len()` equal to the number of placeholders.
//!
//! Builders are pooled process-wide: [`build_seed`] and [`build_str`]
//! borrow one, run the supplied closure, and return it. The pool is
//! bounded and trims oversized buffers on the way back in; counters are
//! exposed for tests through [`pool_stats`].

use crate::error::Result;
use crate::expr::Expr;
use crate::identity::Identity;
use crate::types::{PersistentType, SqliteValue};
use smallvec::SmallVec;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum builders retained by the pool.
const MAX_ENTRIES: usize = 4;
/// Builders returned with a larger backing buffer are trimmed to this.
const BUILDER_CAPACITY: usize = 2048;
/// Floor for the initial buffer allocation.
const MIN_BUILDER_CAPACITY: usize = 1024;

/// An append-only SQL buffer with the ordered list of placeholder types.
#[derive(Debug)]
pub struct SqlBuilder {
    sql: String,
    types: SmallVec<[PersistentType; 8]>,
}

impl SqlBuilder {
    fn with_capacity(capacity: usize) -> Self {
        SqlBuilder {
            sql: String::with_capacity(capacity.max(MIN_BUILDER_CAPACITY)),
            types: SmallVec::new(),
        }
    }

    #[inline]
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    #[inline]
    pub fn append_char(&mut self, ch: char) -> &mut Self {
        self.sql.push(ch);
        self
    }

    #[inline]
    pub fn append_i64(&mut self, value: i64) -> &mut Self {
        use core::fmt::Write;
        let _ = write!(self.sql, "{value}");
        self
    }

    #[inline]
    pub fn append_identity(&mut self, identity: &Identity) -> &mut Self {
        identity.push_to(&mut self.sql);
        self
    }

    /// Serialises an expression node into this builder.
    #[inline]
    pub fn append_expr(&mut self, expr: &Expr) -> Result<()> {
        expr.append_to(self)
    }

    /// Records a `?` placeholder of the given type.
    pub fn register_bindable(&mut self, ty: PersistentType) -> &mut Self {
        self.types.push(ty);
        self.sql.push('?');
        self
    }

    /// Appends the value as an inlined literal. Does not extend the
    /// placeholder-type list.
    pub fn register_argument(&mut self, ty: PersistentType, value: &SqliteValue) -> Result<()> {
        ty.append_literal(value, &mut self.sql)
    }

    /// Comma-separated inlined literals.
    pub fn register_arguments(&mut self, ty: PersistentType, values: &[SqliteValue]) -> Result<()> {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            ty.append_literal(value, &mut self.sql)?;
        }
        Ok(())
    }

    /// Splices a pre-rendered sub-query: `(<sql>)`, carrying its
    /// placeholder types into this builder's list.
    pub fn append_subquery(&mut self, sql: &str, types: &[PersistentType]) -> &mut Self {
        self.sql.push('(');
        self.sql.push_str(sql);
        self.sql.push(')');
        self.types.extend_from_slice(types);
        self
    }

    /// Serialisation helper: `prefix item sep item ... postfix`.
    pub fn append_each<I, F>(
        &mut self,
        items: I,
        separator: &str,
        prefix: &str,
        postfix: &str,
        mut f: F,
    ) -> Result<()>
    where
        I: IntoIterator,
        F: FnMut(&mut SqlBuilder, I::Item) -> Result<()>,
    {
        self.sql.push_str(prefix);
        let mut first = true;
        for item in items {
            if !first {
                self.sql.push_str(separator);
            }
            first = false;
            f(self, item)?;
        }
        self.sql.push_str(postfix);
        Ok(())
    }

    #[inline]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[inline]
    pub fn types(&self) -> &[PersistentType] {
        &self.types
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Snapshots the builder's content as a seed, leaving the builder
    /// reusable.
    pub fn seed(&self) -> StatementSeed {
        StatementSeed {
            sql: self.sql.clone(),
            types: self.types.to_vec(),
        }
    }

    fn clear(&mut self) {
        self.sql.clear();
        self.types.clear();
    }
}

/// The pure `(sql, types)` output of a statement builder, ready for
/// compilation and positional binding.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSeed {
    pub sql: String,
    pub types: Vec<PersistentType>,
}

// ==================== builder pool ====================

static POOL: Mutex<Vec<SqlBuilder>> = Mutex::new(Vec::new());
static GETS: AtomicU64 = AtomicU64::new(0);
static PUTS: AtomicU64 = AtomicU64::new(0);
static EXCEEDED_CAPACITY: AtomicU64 = AtomicU64::new(0);

/// Pool counters, for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub gets: u64,
    pub puts: u64,
    pub exceeded_capacity: u64,
    pub max_entries: usize,
    pub max_builder_capacity: usize,
}

/// Current pool counters.
pub fn pool_stats() -> PoolStats {
    PoolStats {
        gets: GETS.load(Ordering::Relaxed),
        puts: PUTS.load(Ordering::Relaxed),
        exceeded_capacity: EXCEEDED_CAPACITY.load(Ordering::Relaxed),
        max_entries: MAX_ENTRIES,
        max_builder_capacity: BUILDER_CAPACITY,
    }
}

/// Zeroes the pool counters. Intended for tests that assert deltas.
pub fn reset_pool_stats() {
    GETS.store(0, Ordering::Relaxed);
    PUTS.store(0, Ordering::Relaxed);
    EXCEEDED_CAPACITY.store(0, Ordering::Relaxed);
}

fn acquire() -> SqlBuilder {
    GETS.fetch_add(1, Ordering::Relaxed);
    let recycled = POOL.lock().ok().and_then(|mut pool| pool.pop());
    match recycled {
        Some(mut builder) => {
            builder.clear();
            builder
        }
        None => SqlBuilder::with_capacity(BUILDER_CAPACITY),
    }
}

fn release(mut builder: SqlBuilder) {
    PUTS.fetch_add(1, Ordering::Relaxed);
    builder.clear();
    if builder.sql.capacity() > BUILDER_CAPACITY {
        EXCEEDED_CAPACITY.fetch_add(1, Ordering::Relaxed);
        builder.sql.shrink_to(BUILDER_CAPACITY);
    }
    if let Ok(mut pool) = POOL.lock() {
        if pool.len() < MAX_ENTRIES {
            pool.push(builder);
        }
    }
}

/// Runs `f` against a pooled builder and captures `(sql, types)`.
pub fn build_seed<F>(f: F) -> Result<StatementSeed>
where
    F: FnOnce(&mut SqlBuilder) -> Result<()>,
{
    let mut builder = acquire();
    let outcome = f(&mut builder).map(|()| builder.seed());
    release(builder);
    outcome
}

/// Runs `f` against a pooled builder and captures the SQL text alone.
pub fn build_str<F>(f: F) -> Result<String>
where
    F: FnOnce(&mut SqlBuilder) -> Result<()>,
{
    let mut builder = acquire();
    let outcome = f(&mut builder).map(|()| builder.sql.clone());
    release(builder);
    outcome
}
