use tabula::{FieldDef, Type, Value};
use tests::{tests, DbTest};

/// A chain of generated formulas is computed by the database on both
/// backends, whether or not generated columns may reference each other.
async fn generated_chain(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let f1 = db.field(FieldDef::stored(&table.id, "f1", Type::Number)).await;
    let f2 = db
        .field(FieldDef::formula(&table.id, "f2", format!("{{{}}} + 10", f1.id)).require_generated())
        .await;
    let f3 = db
        .field(FieldDef::formula(&table.id, "f3", format!("{{{}}} * 2", f2.id)).require_generated())
        .await;
    let f4 = db
        .field(FieldDef::formula(&table.id, "f4", format!("{{{}}} + 5", f3.id)).require_generated())
        .await;

    for field in [&f2, &f3, &f4] {
        assert!(field.db_generated, "{} is not generated", field.id);
    }

    let record = db.insert(&table, vec![(&f1, Value::Number(1.0))]).await;
    assert_eq!(db.cell(&f2, &record).await, Value::Number(11.0));
    assert_eq!(db.cell(&f3, &record).await, Value::Number(22.0));
    assert_eq!(db.cell(&f4, &record).await, Value::Number(27.0));

    db.update(&table, &record, &f1, 2.0).await;
    assert_eq!(db.cell(&f4, &record).await, Value::Number(29.0));
}

/// Editing the middle of a generated chain rebuilds what depends on it.
async fn generated_dependents_follow_an_edit(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let b = db
        .field(FieldDef::formula(&table.id, "b", format!("{{{}}} + 1", a.id)).require_generated())
        .await;
    let c = db
        .field(FieldDef::formula(&table.id, "c", format!("{{{}}} * 2", b.id)).require_generated())
        .await;

    let record = db.insert(&table, vec![(&a, Value::Number(1.0))]).await;
    assert_eq!(db.cell(&c, &record).await, Value::Number(4.0));

    db.engine
        .definitions()
        .update_formula(&mut *db.conn, &b.id, &format!("{{{}}} + 100", a.id))
        .await
        .unwrap();

    assert_eq!(db.cell(&b, &record).await, Value::Number(101.0));
    assert_eq!(db.cell(&c, &record).await, Value::Number(202.0));

    let c = db.reload(&c).await;
    assert!(c.db_generated);
}

tests!(generated_chain, generated_dependents_follow_an_edit);
