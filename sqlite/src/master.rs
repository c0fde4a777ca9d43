//! The `sqlite_master` schema table.
//!
//! Exposed as an ordinary read-only [`Table`] declaration so existence
//! checks and SQL readback go through the same typed query path as user
//! tables.

use std::sync::OnceLock;
use welite_core::source::{Column, Table, TableBuilder};

/// Typed handles onto `sqlite_master`.
#[derive(Debug)]
pub struct SqliteMaster {
    pub table: Table,
    /// `table`, `index`, `view`, or `trigger`.
    pub object_type: Column<String>,
    pub name: Column<String>,
    pub tbl_name: Column<String>,
    pub rootpage: Column<i64>,
    pub sql: Column<Option<String>>,
}

static MASTER: OnceLock<SqliteMaster> = OnceLock::new();

/// The shared `sqlite_master` declaration.
pub fn sqlite_master() -> &'static SqliteMaster {
    MASTER.get_or_init(|| {
        let mut tb = TableBuilder::new_unchecked("sqlite_master");
        let object_type = tb.column::<String>("type", |c| c);
        let name = tb.column::<String>("name", |c| c);
        let tbl_name = tb.column::<String>("tbl_name", |c| c);
        let rootpage = tb.column::<i64>("rootpage", |c| c);
        let sql = tb.column::<Option<String>>("sql", |c| c);
        let table = tb
            .build()
            .unwrap_or_else(|e| unreachable!("sqlite_master declaration is static: {e}"));
        SqliteMaster {
            table,
            object_type,
            name,
            tbl_name,
            rootpage,
            sql,
        }
    })
}
