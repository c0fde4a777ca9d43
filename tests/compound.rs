//! Compound selects: UNION, UNION ALL, INTERSECT, EXCEPT.

use welite::prelude::*;

struct TwoTables {
    db: Database,
    a: Table,
    a_id: Column<i64>,
    b: Table,
    b_id: Column<i64>,
}

/// Two single-column tables with values {1, 2} and {2, 3}.
fn setup() -> TwoTables {
    let mut a_tb = TableBuilder::new("TableA").unwrap();
    let a_id = a_tb.column::<i64>("id", |c| c.primary_key());
    let a = a_tb.build().unwrap();
    let mut b_tb = TableBuilder::new("TableB").unwrap();
    let b_id = b_tb.column::<i64>("id", |c| c.primary_key());
    let b = b_tb.build().unwrap();

    let db = Database::open(
        OpenParams::in_memory(),
        &Schema::new().table(a.clone()).table(b.clone()),
        &[],
    )
    .unwrap();

    db.auto_commit("seed", |tx| {
        for value in [1i64, 2] {
            let insert = a.insert_values(|v| {
                v.value(&a_id, value)?;
                Ok(())
            })?;
            tx.insert(&insert, no_args)?;
        }
        for value in [2i64, 3] {
            let insert = b.insert_values(|v| {
                v.value(&b_id, value)?;
                Ok(())
            })?;
            tx.insert(&insert, no_args)?;
        }
        Ok(())
    })
    .unwrap();

    TwoTables { db, a, a_id, b, b_id }
}

fn counts(t: &TwoTables, op: CompoundOp) -> i64 {
    let first = t.a.select(&t.a_id).all();
    let second = t.b.select(&t.b_id).all();
    let compound = match op {
        CompoundOp::Union => first.union(second),
        CompoundOp::UnionAll => first.union_all(second),
        CompoundOp::Intersect => first.intersect(second),
        CompoundOp::Except => first.except(second),
    }
    .unwrap();
    t.db.query(|q| q.count_compound(&compound, no_args)).unwrap()
}

#[test]
fn union_removes_duplicates() {
    let t = setup();
    assert_eq!(counts(&t, CompoundOp::Union), 3);
}

#[test]
fn union_all_keeps_duplicates() {
    let t = setup();
    assert_eq!(counts(&t, CompoundOp::UnionAll), 4);
}

#[test]
fn intersect_keeps_common() {
    let t = setup();
    assert_eq!(counts(&t, CompoundOp::Intersect), 1);
}

#[test]
fn except_keeps_left_only() {
    let t = setup();
    assert_eq!(counts(&t, CompoundOp::Except), 1);
}

#[test]
fn compound_order_by_references_result_column() {
    let t = setup();
    let compound = t
        .a
        .select(&t.a_id)
        .all()
        .union(t.b.select(&t.b_id).all())
        .unwrap();
    let id_ref = compound.column_at::<i64>(0).unwrap();
    let ordered = compound.order_by(id_ref, SortOrder::Desc);
    let seed = ordered.seed().unwrap();
    let values =
        t.db.query(|q| q.seed_rows(&seed, no_args, |row| row.get_i64(0)))
            .unwrap();
    assert_eq!(values, [3, 2, 1]);
}

#[test]
fn compound_as_outer_source() {
    let t = setup();
    let compound = t
        .a
        .select(&t.a_id)
        .all()
        .union_all(t.b.select(&t.b_id).all())
        .unwrap();
    let seed = compound.select_all().all().seed().unwrap();
    assert!(seed.sql.starts_with("SELECT \"id\" FROM (SELECT"));
    let rows =
        t.db.query(|q| q.seed_rows(&seed, no_args, |row| row.get_i64(0)))
            .unwrap();
    assert_eq!(rows.len(), 4);
}

#[test]
fn three_way_chain_keeps_left_to_right_precedence() {
    let t = setup();
    let compound = t
        .a
        .select(&t.a_id)
        .all()
        .union_all(t.b.select(&t.b_id).all())
        .unwrap()
        .intersect(t.b.select(&t.b_id).all())
        .unwrap();
    let sql = compound.seed().unwrap().sql;
    let union_pos = sql.find("UNION ALL").unwrap();
    let intersect_pos = sql.find("INTERSECT").unwrap();
    assert!(union_pos < intersect_pos);
}
