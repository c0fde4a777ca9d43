//! Triggers and the scoped trigger-body DSL.
//!
//! A trigger body is built inside a closure receiving a
//! [`TriggerScope`]: `old()` and `new()` are capability methods that
//! validate the event kind and column ownership at construction time, and
//! body statements are rejected if they carry bind placeholders (triggers
//! are not parameterisable).

use crate::builder::build_str;
use crate::error::{CoreError, Result};
use crate::expr::{Expr, Expression, RaiseAction, case, raise};
use crate::identity::Identity;
use crate::source::column::Column;
use crate::source::{Creatable, SchemaObjectKind, Table};
use crate::stmt::{DeleteStatement, InsertStatement, UpdateStatement};
use crate::types::Persisted;

/// When the trigger fires relative to the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTime {
    Before,
    After,
}

impl TriggerTime {
    const fn keyword(self) -> &'static str {
        match self {
            TriggerTime::Before => "BEFORE",
            TriggerTime::After => "AFTER",
        }
    }
}

/// The event the trigger reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    Insert,
    Update,
    UpdateOf(Vec<Identity>),
    Delete,
}

/// A trigger attached to a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    identity: Identity,
    table: Table,
    time: TriggerTime,
    event: TriggerEvent,
    temporary: bool,
    when: Option<Expr>,
    body: Vec<String>,
}

impl Trigger {
    pub fn builder(name: &str) -> TriggerBuilder {
        TriggerBuilder {
            identity: Identity::forced(name),
            time: TriggerTime::After,
            temporary: false,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.identity.unquoted()
    }
}

impl Creatable for Trigger {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn kind(&self) -> SchemaObjectKind {
        SchemaObjectKind::Trigger
    }

    fn create_sql(&self, temporary: bool) -> Result<String> {
        build_str(|b| {
            b.append("CREATE ");
            if temporary || self.temporary {
                b.append("TEMP ");
            }
            b.append("TRIGGER IF NOT EXISTS ");
            b.append_identity(&self.identity);
            b.append_char(' ').append(self.time.keyword()).append_char(' ');
            match &self.event {
                TriggerEvent::Insert => {
                    b.append("INSERT");
                }
                TriggerEvent::Update => {
                    b.append("UPDATE");
                }
                TriggerEvent::UpdateOf(columns) => {
                    b.append("UPDATE OF ");
                    let mut first = true;
                    for column in columns {
                        if !first {
                            b.append(", ");
                        }
                        first = false;
                        b.append_identity(column);
                    }
                }
                TriggerEvent::Delete => {
                    b.append("DELETE");
                }
            }
            b.append(" ON ").append_identity(self.table.identity());
            if let Some(when) = &self.when {
                b.append(" WHEN ");
                when.append_to(b)?;
            }
            b.append(" BEGIN ");
            for statement in &self.body {
                b.append(statement).append("; ");
            }
            b.append("END;");
            Ok(())
        })
    }

    fn drop_sql(&self) -> String {
        let mut sql = String::from("DROP TRIGGER IF EXISTS ");
        self.identity.push_to(&mut sql);
        sql
    }
}

/// Accumulates name, timing, and temporary-ness before the event binds
/// the trigger to a table.
#[derive(Debug)]
pub struct TriggerBuilder {
    identity: Identity,
    time: TriggerTime,
    temporary: bool,
}

impl TriggerBuilder {
    pub fn before(mut self) -> Self {
        self.time = TriggerTime::Before;
        self
    }

    pub fn after(mut self) -> Self {
        self.time = TriggerTime::After;
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn on_insert(self, table: &Table) -> TriggerEvented {
        self.evented(table, TriggerEvent::Insert)
    }

    pub fn on_update(self, table: &Table) -> TriggerEvented {
        self.evented(table, TriggerEvent::Update)
    }

    pub fn on_update_of(
        self,
        table: &Table,
        columns: &[&crate::source::AnyColumn],
    ) -> TriggerEvented {
        let names = columns.iter().map(|c| c.name().clone()).collect();
        self.evented(table, TriggerEvent::UpdateOf(names))
    }

    pub fn on_delete(self, table: &Table) -> TriggerEvented {
        self.evented(table, TriggerEvent::Delete)
    }

    fn evented(self, table: &Table, event: TriggerEvent) -> TriggerEvented {
        TriggerEvented {
            identity: self.identity,
            time: self.time,
            temporary: self.temporary,
            table: table.clone(),
            event,
        }
    }
}

/// A trigger bound to its table and event, awaiting its body.
#[derive(Debug)]
pub struct TriggerEvented {
    identity: Identity,
    time: TriggerTime,
    temporary: bool,
    table: Table,
    event: TriggerEvent,
}

impl TriggerEvented {
    /// Builds the body inside a scope providing `old()`/`new()` and the
    /// nested statement adders.
    pub fn build(self, f: impl FnOnce(&mut TriggerScope) -> Result<()>) -> Result<Trigger> {
        let mut scope = TriggerScope {
            table: self.table.clone(),
            event: self.event.clone(),
            when: None,
            statements: Vec::new(),
        };
        f(&mut scope)?;
        if scope.statements.is_empty() {
            return Err(CoreError::schema(format!(
                "trigger {} has an empty body",
                self.identity.unquoted()
            )));
        }
        Ok(Trigger {
            identity: self.identity,
            table: self.table,
            time: self.time,
            event: self.event,
            temporary: self.temporary,
            when: scope.when,
            body: scope.statements,
        })
    }
}

/// The body-building capability handed to the trigger closure.
pub struct TriggerScope {
    table: Table,
    event: TriggerEvent,
    when: Option<Expr>,
    statements: Vec<String>,
}

impl TriggerScope {
    /// `OLD.<column>`; invalid on INSERT events and for foreign columns.
    pub fn old<T: Persisted>(&self, column: &Column<T>) -> Result<Expression<T>> {
        if matches!(self.event, TriggerEvent::Insert) {
            return Err(CoreError::schema("OLD is not available on INSERT"));
        }
        self.pseudo_column("OLD", column)
    }

    /// `NEW.<column>`; invalid on DELETE events and for foreign columns.
    pub fn new<T: Persisted>(&self, column: &Column<T>) -> Result<Expression<T>> {
        if matches!(self.event, TriggerEvent::Delete) {
            return Err(CoreError::schema("NEW is not available on DELETE"));
        }
        self.pseudo_column("NEW", column)
    }

    fn pseudo_column<T: Persisted>(
        &self,
        which: &str,
        column: &Column<T>,
    ) -> Result<Expression<T>> {
        if column.qualifier() != self.table.identity() {
            return Err(CoreError::schema(format!(
                "column {} does not belong to triggered table {}",
                column.name(),
                self.table.name()
            )));
        }
        Ok(Expression::wrap(Expr::Column {
            qualifier: Identity::new(which),
            name: column.name().clone(),
            ty: column.persistent_type(),
        }))
    }

    /// The trigger's `WHEN` predicate; settable once.
    pub fn when(&mut self, predicate: Expression<bool>) -> Result<()> {
        if self.when.is_some() {
            return Err(CoreError::schema("WHEN already set"));
        }
        let rendered = crate::builder::build_seed(|b| predicate.node().append_to(b))?;
        if !rendered.types.is_empty() {
            return Err(CoreError::schema(
                "trigger WHEN must not carry bind placeholders",
            ));
        }
        self.when = Some(predicate.into_node());
        Ok(())
    }

    /// Adds a nested INSERT to the body.
    pub fn insert(&mut self, statement: &InsertStatement) -> Result<()> {
        let seed = statement.seed()?;
        self.push(seed)
    }

    /// Adds a nested UPDATE to the body.
    pub fn update(&mut self, statement: &UpdateStatement) -> Result<()> {
        let seed = statement.seed()?;
        self.push(seed)
    }

    /// Adds a nested DELETE to the body.
    pub fn delete(&mut self, statement: &DeleteStatement) -> Result<()> {
        let seed = statement.seed()?;
        self.push(seed)
    }

    /// `SELECT CASE WHEN <condition> THEN RAISE(<action>, '<message>')
    /// END`, the conventional constraint-enforcement statement.
    pub fn select_raise_when(
        &mut self,
        condition: Expression<bool>,
        action: RaiseAction,
        message: &str,
    ) -> Result<()> {
        // RAISE(IGNORE) takes no message.
        let raised = if action == RaiseAction::Ignore {
            crate::expr::raise_ignore()
        } else {
            raise(action, message)
        };
        let raise_case = case::<i64>().when(condition, raised).end();
        let seed = crate::builder::build_seed(|b| {
            b.append("SELECT ");
            raise_case.node().append_to(b)
        })?;
        self.push(seed)
    }

    fn push(&mut self, seed: crate::builder::StatementSeed) -> Result<()> {
        if !seed.types.is_empty() {
            return Err(CoreError::schema(
                "trigger bodies must not carry bind placeholders",
            ));
        }
        self.statements.push(seed.sql);
        Ok(())
    }
}
