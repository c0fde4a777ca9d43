//! # WeLite
//!
//! A typed, composable SQL DSL over SQLite. Schemas, expressions,
//! queries, and mutations are values in Rust; the library generates
//! SQLite-dialect SQL, caches compiled statements, and runs all work
//! inside scoped transactions.
//!
//! ```no_run
//! use welite::prelude::*;
//!
//! fn main() -> welite::sqlite::Result<()> {
//!     let mut tb = TableBuilder::new("Artist")?;
//!     let id = tb.column::<i64>("ArtistId", |c| c.auto_increment());
//!     let name = tb.column::<String>("ArtistName", |c| c);
//!     let artist = tb.build()?;
//!
//!     let db = Database::open(
//!         OpenParams::in_memory(),
//!         &Schema::new().table(artist.clone()),
//!         &[],
//!     )?;
//!
//!     db.transaction("add artist", |tx| {
//!         let insert = artist.insert_values(|v| {
//!             v.value(&name, "Led Zeppelin".to_owned())?;
//!             Ok(())
//!         })?;
//!         tx.insert(&insert, no_args)?;
//!         tx.set_successful()?;
//!         Ok(())
//!     })?;
//!
//!     let names = db.query(|q| {
//!         q.rows(&artist.select(&name).where_(id.greater(0i64)), no_args, |row| {
//!             row.get_string(0)
//!         })
//!     })?;
//!     assert_eq!(names, ["Led Zeppelin"]);
//!     db.close()
//! }
//! ```

pub use welite_core as core;
pub use welite_sqlite as sqlite;

pub use welite_core::{and, or};

/// The combined prelude of both member crates.
pub mod prelude {
    pub use welite_core::prelude::*;
    pub use welite_sqlite::prelude::*;
}
