//! The transaction kernel: marking, rollback, nesting, callbacks,
//! cancellation, and thread discipline.

mod common;

use common::{add_artist, open_music};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use welite::prelude::*;
use welite::sqlite::Error;

#[test]
fn successful_transaction_commits() {
    let (db, m) = open_music();
    db.transaction("insert", |tx| {
        let insert = m.artist.insert_values(|v| {
            v.value(&m.artist_name, "a".to_owned())?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)?;
        tx.set_successful()?;
        Ok(())
    })
    .unwrap();

    let count = db
        .query(|q| q.count(&m.artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn rollback_discards_writes() {
    let (db, m) = open_music();
    db.transaction("insert then rollback", |tx| {
        let insert = m.artist.insert_values(|v| {
            v.value(&m.artist_name, "a".to_owned())?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)?;
        tx.rollback()?;
        Ok(())
    })
    .unwrap();

    let count = db
        .query(|q| q.count(&m.artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn unmarked_transaction_errors_and_rolls_back() {
    let (db, m) = open_music();
    let result = db.transaction("forgot to mark", |tx| {
        let insert = m.artist.insert_values(|v| {
            v.value(&m.artist_name, "a".to_owned())?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)?;
        Ok(())
    });
    assert!(matches!(result, Err(Error::UnmarkedTransaction(_))));

    let count = db
        .query(|q| q.count(&m.artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn unmarked_transaction_tolerated_when_configured() {
    let schema_music = common::music();
    let db = Database::open(
        OpenParams::in_memory().throw_if_no_choice(false),
        &Schema::new()
            .table(schema_music.artist.clone())
            .table(schema_music.album.clone()),
        &[],
    )
    .unwrap();
    let value = db.transaction("unmarked", |_tx| Ok(7)).unwrap();
    assert_eq!(value, 7);
}

#[test]
fn closure_error_wraps_with_unit_of_work() {
    let (db, m) = open_music();
    let result: welite::sqlite::Result<()> = db.transaction("doomed work", |tx| {
        let insert = m.artist.insert_values(|v| {
            v.value(&m.artist_name, "a".to_owned())?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)?;
        Err(welite::core::CoreError::unsupported("boom").into())
    });
    match result {
        Err(Error::Uncaught { unit_of_work, .. }) => {
            assert_eq!(unit_of_work, "doomed work");
        }
        other => panic!("expected Uncaught, got {other:?}"),
    }
    let count = db
        .query(|q| q.count(&m.artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn set_successful_is_idempotent_but_final() {
    let (db, _) = open_music();
    db.transaction("marking", |tx| {
        tx.set_successful()?;
        tx.set_successful()?; // no-op
        Ok(())
    })
    .unwrap();

    let result = db.transaction("mark after rollback", |tx| {
        tx.rollback()?;
        tx.set_successful()
    });
    assert!(result.is_err());
}

#[test]
fn view_created_in_rolled_back_transaction_does_not_exist() {
    let (db, m) = open_music();
    let view = View::new("Names", &m.artist.select(&m.artist_name).all()).unwrap();
    db.transaction("create view then rollback", |tx| {
        tx.create_view(&view)?;
        assert!(tx.exists(&view)?);
        tx.rollback()?;
        Ok(())
    })
    .unwrap();
    assert!(!db.exists(&view).unwrap());
}

#[test]
fn commit_callbacks_fire_in_order_after_commit() {
    let (db, m) = open_music();
    let fired: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));

    let first = fired.clone();
    let second = fired.clone();
    db.transaction("with callbacks", |tx| {
        tx.on_commit(move || {
            first.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst).ok();
        });
        tx.on_commit(move || {
            second.compare_exchange(1, 2, Ordering::SeqCst, Ordering::SeqCst).ok();
        });
        tx.set_successful()?;
        Ok(())
    })
    .unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    // Callbacks registered in a rolled-back transaction never fire.
    let rolled = fired.clone();
    db.transaction("rolled back callbacks", |tx| {
        tx.on_commit(move || {
            rolled.store(99, Ordering::SeqCst);
        });
        tx.rollback()?;
        Ok(())
    })
    .unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 2);
    let _ = m;
}

#[test]
fn nested_transaction_reuses_outer_and_rollback_poisons() {
    let (db, m) = open_music();
    let result = db.transaction("outer", |tx| {
        let insert = m.artist.insert_values(|v| {
            v.value(&m.artist_name, "outer row".to_owned())?;
            Ok(())
        })?;
        tx.insert(&insert, no_args)?;

        db.auto_commit("inner", |inner| {
            inner.rollback()?;
            Ok(())
        })?;

        tx.set_successful()?;
        Ok(())
    });
    // Outer marked successful, but the nested rollback poisons commit.
    assert!(result.is_ok());
    let count = db
        .query(|q| q.count(&m.artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn cancellation_rolls_back_and_surfaces() {
    let (db, m) = open_music();
    let token = CancellationToken::new();
    let options = TransactionOptions {
        token: Some(token.clone()),
        ..TransactionOptions::default()
    };
    let result: welite::sqlite::Result<()> =
        db.transaction_with("cancelled work", options, |tx| {
            let insert = m.artist.insert_values(|v| {
                v.value(&m.artist_name, "a".to_owned())?;
                Ok(())
            })?;
            tx.insert(&insert, no_args)?;
            token.cancel();
            // The next statement observes the token.
            let insert = m.artist.insert_values(|v| {
                v.value(&m.artist_name, "b".to_owned())?;
                Ok(())
            })?;
            tx.insert(&insert, no_args)?;
            tx.set_successful()?;
            Ok(())
        });
    assert!(matches!(result, Err(Error::Cancelled)));

    let count = db
        .query(|q| q.count(&m.artist.select_count(None), no_args))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn moved_database_hits_thread_guard() {
    let (db, m) = open_music();
    add_artist(&db, &m, "a");
    let handle = std::thread::spawn(move || {
        let result = db.query(|q| q.count(&m.artist.select_count(None), no_args));
        matches!(result, Err(Error::WrongThread))
    });
    assert!(handle.join().unwrap());
}

#[test]
fn arbitrary_threads_allowed_when_configured() {
    let m = common::music();
    let db = Database::open(
        OpenParams::in_memory().allow_work_on_arbitrary_threads(true),
        &Schema::new().table(m.artist.clone()).table(m.album.clone()),
        &[],
    )
    .unwrap();
    let handle = std::thread::spawn(move || {
        db.query(|q| q.count(&m.artist.select_count(None), no_args))
            .unwrap()
    });
    assert_eq!(handle.join().unwrap(), 0);
}

#[test]
fn close_is_idempotent() {
    let (db, _) = open_music();
    db.close().unwrap();
    db.close().unwrap();
    assert!(!db.is_open());
    assert!(matches!(
        db.query(|q| q.count(&common::music().artist.select_count(None), no_args)),
        Err(Error::Closed)
    ));
}
