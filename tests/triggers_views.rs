//! Views and triggers end to end.

mod common;

use common::{add_artist, open_music};
use welite::prelude::*;

#[test]
fn view_reads_like_a_table() {
    let (db, m) = open_music();
    add_artist(&db, &m, "Led Zeppelin");
    add_artist(&db, &m, "Black Sabbath");

    let view = View::new(
        "ArtistNames",
        &m.artist
            .select(&m.artist_name)
            .where_(m.artist_id.greater(0i64)),
    )
    .unwrap();
    db.auto_commit("create view", |tx| tx.create_view(&view)).unwrap();
    assert!(db.exists(&view).unwrap());

    let name_col = view.column_at::<String>(0).unwrap();
    let names = db
        .query(|q| {
            q.rows(
                &view
                    .select(&name_col)
                    .all()
                    .order_by(&name_col, SortOrder::Asc),
                no_args,
                |row| row.get_string(0),
            )
        })
        .unwrap();
    assert_eq!(names, ["Black Sabbath", "Led Zeppelin"]);
}

#[test]
fn view_with_named_columns() {
    let (db, m) = open_music();
    add_artist(&db, &m, "x");

    let view = View::with_columns(
        "Names",
        &m.artist.select(&m.artist_name).all(),
        &["TheName"],
    )
    .unwrap();
    db.auto_commit("create view", |tx| tx.create_view(&view)).unwrap();

    let renamed = view.column_at::<String>(0).unwrap();
    assert_eq!(renamed.name().unquoted(), "TheName");
    let names = db
        .query(|q| {
            q.rows(&view.select(&renamed).all(), no_args, |row| {
                row.get_string(0)
            })
        })
        .unwrap();
    assert_eq!(names, ["x"]);
}

#[test]
fn delete_trigger_cascades_manually() {
    let (db, m) = open_music();
    let artist_id = add_artist(&db, &m, "doomed");
    db.auto_commit("album", |tx| {
        let insert = m.album.insert_values(|v| {
            v.value(&m.album_name, "gone".to_owned())?;
            v.value(&m.album_artist, artist_id)?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)
    })
    .unwrap();

    let trigger = Trigger::builder("DeleteArtistAlbums")
        .before()
        .on_delete(&m.artist)
        .build(|s| {
            let old_id = s.old(&m.artist_id)?;
            s.delete(&m.album.delete_where(m.album_artist.eq(old_id)))
        })
        .unwrap();
    db.auto_commit("create trigger", |tx| tx.create(&trigger)).unwrap();
    assert!(db.exists(&trigger).unwrap());

    db.auto_commit("delete artist", |tx| {
        tx.delete(&m.artist.delete_where(m.artist_id.eq(artist_id)), no_args)
    })
    .unwrap();

    let albums = db
        .query(|q| q.count(&m.album.select_count(None), no_args))
        .unwrap();
    assert_eq!(albums, 0);
}

#[test]
fn raise_trigger_blocks_bad_rows() {
    let (db, m) = open_music();

    let trigger = Trigger::builder("NoEmptyNames")
        .before()
        .on_insert(&m.artist)
        .build(|s| {
            let new_name = s.new(&m.artist_name)?;
            s.select_raise_when(new_name.eq(""), RaiseAction::Abort, "empty artist name")
        })
        .unwrap();
    db.auto_commit("create trigger", |tx| tx.create(&trigger)).unwrap();

    let result = db.auto_commit("insert empty", |tx| {
        let insert = m.artist.insert_values(|v| {
            v.value(&m.artist_name, String::new())?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)
    });
    assert!(result.is_err());

    add_artist(&db, &m, "fine");
    let count = db
        .query(|q| q.count(&m.artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn trigger_create_is_idempotent() {
    let (db, m) = open_music();
    let trigger = Trigger::builder("Touch")
        .after()
        .on_insert(&m.artist)
        .build(|s| {
            let new_id = s.new(&m.artist_id)?;
            s.select_raise_when(new_id.less(0i64), RaiseAction::Ignore, "")
        })
        .unwrap();
    db.auto_commit("twice", |tx| {
        tx.create(&trigger)?;
        tx.create(&trigger)
    })
    .unwrap();
    assert!(db.exists(&trigger).unwrap());
}
