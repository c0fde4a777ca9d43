//! Shared example schema for integration tests.
#![allow(dead_code)]

use welite::prelude::*;

pub struct Music {
    pub artist: Table,
    pub artist_id: Column<i64>,
    pub artist_name: Column<String>,
    pub album: Table,
    pub album_id: Column<i64>,
    pub album_name: Column<String>,
    pub album_artist: Column<i64>,
}

pub fn music() -> Music {
    let mut artist_tb = TableBuilder::new("Artist").unwrap();
    let artist_id = artist_tb.column::<i64>("ArtistId", |c| c.auto_increment());
    let artist_name = artist_tb.column::<String>("ArtistName", |c| c);
    let artist = artist_tb.build().unwrap();

    let mut album_tb = TableBuilder::new("Album").unwrap();
    let album_id = album_tb.column::<i64>("AlbumId", |c| c.auto_increment());
    let album_name = album_tb.column::<String>("AlbumName", |c| c);
    let album_artist = album_tb.column::<i64>("ArtistId", |c| {
        c.references(&artist_id).on_delete(FkAction::Cascade)
    });
    let album = album_tb.build().unwrap();

    Music {
        artist,
        artist_id,
        artist_name,
        album,
        album_id,
        album_name,
        album_artist,
    }
}

pub fn open_music() -> (Database, Music) {
    let music = music();
    let schema = Schema::new()
        .table(music.artist.clone())
        .table(music.album.clone());
    let db = Database::open(OpenParams::in_memory(), &schema, &[]).unwrap();
    (db, music)
}

/// Inserts an artist and returns the new row id.
pub fn add_artist(db: &Database, music: &Music, name: &str) -> i64 {
    db.auto_commit("add artist", |tx| {
        let insert = music.artist.insert_values(|v| {
            v.bind_arg(&music.artist_name)?;
            Ok(())
        })?;
        let name = name.to_owned();
        tx.insert(&insert, move |b| b.set(0, name))
    })
    .unwrap()
}
