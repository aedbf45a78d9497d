use tabula::{FieldDef, Type, UpdateCells, Value};
use tests::{change, tests, DbTest};

/// A derived value that comes out equal to its snapshot is not reported.
async fn unchanged_values_are_not_emitted(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let b = db.field(FieldDef::stored(&table.id, "b", Type::Number)).await;
    let sum = db
        .field(FieldDef::formula(&table.id, "sum", format!("{{{}}} + {{{}}}", a.id, b.id)))
        .await;
    let product = db
        .field(FieldDef::formula(&table.id, "product", format!("{{{}}} * {{{}}}", a.id, b.id)))
        .await;

    let record = db
        .insert(&table, vec![(&a, Value::Number(1.0)), (&b, Value::Number(2.0))])
        .await;
    let version = db.version(&table, &record).await;

    let mut swap = UpdateCells::new(&table)
        .set(record.clone(), &a, 2.0)
        .set(record.clone(), &b, 1.0);
    let changes = db.run(&mut swap).await.unwrap();

    assert!(change(&changes, &record, &sum).is_none());
    assert!(change(&changes, &record, &product).is_none());
    assert_eq!(db.cell(&sum, &record).await, Value::Number(3.0));

    // The user edit still bumped the version.
    assert_eq!(db.version(&table, &record).await, version + 1);

    let mut edit = UpdateCells::new(&table).set(record.clone(), &a, 3.0);
    let changes = db.run(&mut edit).await.unwrap();

    let emitted = change(&changes, &record, &sum).unwrap();
    assert_eq!(emitted.old_value, Value::Number(3.0));
    assert_eq!(emitted.new_value, Value::Number(4.0));
    assert_eq!(emitted.version, version + 2);
    assert_eq!(
        change(&changes, &record, &product).unwrap().new_value,
        Value::Number(3.0)
    );
}

tests!(unchanged_values_are_not_emitted);
