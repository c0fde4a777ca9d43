//! The migration runner: stepping versions, required-migration failure,
//! and the drop-and-recreate fallback.

use welite::prelude::*;
use welite::sqlite::Error;

fn artist_schema() -> (Schema, Table, Column<i64>, Column<String>) {
    let mut tb = TableBuilder::new("Artist").unwrap();
    let id = tb.column::<i64>("ArtistId", |c| c.auto_increment());
    let name = tb.column::<String>("ArtistName", |c| c);
    let artist = tb.build().unwrap();
    (Schema::new().table(artist.clone()), artist, id, name)
}

fn genre_table() -> Table {
    let mut tb = TableBuilder::new("Genre").unwrap();
    tb.column::<i64>("GenreId", |c| c.auto_increment());
    tb.column::<String>("GenreName", |c| c);
    tb.build().unwrap()
}

#[test]
fn migration_path_runs_and_bumps_version() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let (schema, artist, _, name) = artist_schema();
    {
        let db = Database::open(OpenParams::file(&path), &schema, &[]).unwrap();
        db.auto_commit("seed", |tx| {
            let insert = artist.insert_values(|v| {
                v.value(&name, "keep me".to_owned())?;
                Ok(())
            })?;
            tx.insert(&insert, no_args)
        })
        .unwrap();
        db.close().unwrap();
    }

    let genre = genre_table();
    let v2_schema = Schema::new().table(artist.clone()).table(genre.clone());
    let migrate_to_2 = {
        let genre = genre.clone();
        Migration::new(1, 2, move |tx| tx.create_table(&genre))
    };
    let db = Database::open(
        OpenParams::file(&path).version(2),
        &v2_schema,
        &[migrate_to_2],
    )
    .unwrap();

    assert_eq!(db.state(), DbState::Opened);
    assert!(db.exists(&genre).unwrap());
    // Existing data survives a stepped migration.
    let count = db
        .query(|q| q.count(&artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 1);
    db.close().unwrap();
}

#[test]
fn missing_required_migration_fails() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let (schema, _, _, _) = artist_schema();
    Database::open(OpenParams::file(&path), &schema, &[])
        .unwrap()
        .close()
        .unwrap();

    let result = Database::open(
        OpenParams::file(&path).version(3).require_migration(true),
        &schema,
        &[],
    );
    assert!(matches!(
        result,
        Err(Error::MigrationMissing { from: 1, to: 3 })
    ));
}

#[test]
fn missing_migration_recreates_schema() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let (schema, artist, _, name) = artist_schema();
    {
        let db = Database::open(OpenParams::file(&path), &schema, &[]).unwrap();
        db.auto_commit("seed", |tx| {
            let insert = artist.insert_values(|v| {
                v.value(&name, "will vanish".to_owned())?;
                Ok(())
            })?;
            tx.insert(&insert, no_args)
        })
        .unwrap();
        db.close().unwrap();
    }

    let genre = genre_table();
    let v2_schema = Schema::new().table(artist.clone()).table(genre.clone());
    let db = Database::open(OpenParams::file(&path).version(2), &v2_schema, &[]).unwrap();

    assert!(db.exists(&genre).unwrap());
    // The fallback drops everything and recreates from the declaration.
    let count = db
        .query(|q| q.count(&artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 0);
    db.close().unwrap();
}

#[test]
fn reopen_at_same_version_preserves_data() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let (schema, artist, _, name) = artist_schema();
    {
        let db = Database::open(OpenParams::file(&path), &schema, &[]).unwrap();
        db.auto_commit("seed", |tx| {
            let insert = artist.insert_values(|v| {
                v.value(&name, "still here".to_owned())?;
                Ok(())
            })?;
            tx.insert(&insert, no_args)
        })
        .unwrap();
        db.close().unwrap();
    }

    let db = Database::open(OpenParams::file(&path), &schema, &[]).unwrap();
    let count = db
        .query(|q| q.count(&artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 1);
}
