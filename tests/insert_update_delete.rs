//! Mutation statements end to end.

mod common;

use common::{add_artist, open_music};
use welite::prelude::*;

#[test]
fn insert_select_delete_lifecycle() {
    let (db, music) = open_music();

    let row_id = db
        .auto_commit("insert", |tx| {
            let insert = music.artist.insert_values(|v| {
                v.value(&music.artist_name, "Led Zeppelin".to_owned())?;
                Ok(())
            })?;
            tx.insert(&insert, no_args)
        })
        .unwrap();
    assert!(row_id > 0);

    let names = db
        .query(|q| {
            q.rows(
                &music
                    .artist
                    .select(&music.artist_name)
                    .where_(music.artist_id.greater(0i64)),
                no_args,
                |row| row.get_string(0),
            )
        })
        .unwrap();
    assert_eq!(names, ["Led Zeppelin"]);

    let deleted = db
        .auto_commit("delete", |tx| {
            tx.delete(
                &music
                    .artist
                    .delete_where(music.artist_name.eq("Led Zeppelin")),
                no_args,
            )
        })
        .unwrap();
    assert_eq!(deleted, 1);

    let count = db
        .query(|q| q.count(&music.artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn update_with_where_fixes_typo() {
    let (db, music) = open_music();
    add_artist(&db, &music, "Led Zepelin");

    let changed = db
        .auto_commit("fix name", |tx| {
            let update = music
                .artist
                .update_values(|v| {
                    v.value(&music.artist_name, "Led Zeppelin".to_owned())?;
                    Ok(())
                })?
                .where_(music.artist_name.eq("Led Zepelin"));
            tx.update(&update, no_args)
        })
        .unwrap();
    assert_eq!(changed, 1);

    let count = db
        .query(|q| {
            q.count(
                &music
                    .artist
                    .select_count(Some(music.artist_name.eq("Led Zeppelin"))),
                no_args,
            )
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn insert_or_ignore_swallows_conflict() {
    let mut tb = TableBuilder::new("Tag").unwrap();
    let name = tb.column::<String>("name", |c| c.unique());
    let tag = tb.build().unwrap();
    let db = Database::open(
        OpenParams::in_memory(),
        &Schema::new().table(tag.clone()),
        &[],
    )
    .unwrap();

    db.auto_commit("tags", |tx| {
        let insert = tag.insert_with(ConflictPolicy::Ignore, |v| {
            v.value(&name, "rock".to_owned())?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)?;
        tx.insert(&insert, no_args)?;
        Ok(())
    })
    .unwrap();

    let count = db
        .query(|q| q.count(&tag.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn update_with_expression_value() {
    let mut tb = TableBuilder::new("Counter").unwrap();
    let n = tb.column::<i64>("n", |c| c);
    let counter = tb.build().unwrap();
    let db = Database::open(
        OpenParams::in_memory(),
        &Schema::new().table(counter.clone()),
        &[],
    )
    .unwrap();

    db.auto_commit("seed", |tx| {
        let insert = counter.insert_values(|v| {
            v.value(&n, 41i64)?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)
    })
    .unwrap();

    db.auto_commit("bump", |tx| {
        let update = counter
            .update_values(|v| {
                v.expr(&n, n.expr() + 1i64)?;
                Ok(())
            })?
            .all();
        tx.update(&update, no_args)
    })
    .unwrap();

    let value = db
        .query(|q| {
            q.first(&counter.select(&n).all(), no_args, |row| row.get_i64(0))
        })
        .unwrap();
    assert_eq!(value, Some(42));
}

#[test]
fn bound_insert_reuses_one_compiled_statement() {
    let (db, music) = open_music();
    let before = db.statement_cache_stats();

    db.auto_commit("bulk", |tx| {
        let insert = music.artist.insert_values(|v| {
            v.bind_arg(&music.artist_name)?;
            Ok(())
        })?;
        for name in ["a", "b", "c", "d", "e"] {
            tx.insert(&insert, |b| b.set(0, name.to_owned()))?;
        }
        Ok(())
    })
    .unwrap();

    let after = db.statement_cache_stats();
    assert_eq!(after.compiled - before.compiled, 1);
    assert_eq!(after.reused - before.reused, 4);
}
