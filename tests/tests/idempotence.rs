use tabula::{ChangedCell, FieldDef, Statements, TableChanges, Type, Value};
use tests::{change, tests, DbTest};

async fn rerun_without_mutation_emits_nothing(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let double = db
        .field(FieldDef::formula(&table.id, "double", format!("{{{}}} * 2", a.id)))
        .await;

    let record = db.insert(&table, vec![(&a, Value::Number(3.0))]).await;
    assert_eq!(db.cell(&double, &record).await, Value::Number(6.0));

    let changes = db.update(&table, &record, &a, 5.0).await;
    let emitted = change(&changes, &record, &double).unwrap();
    assert_eq!(emitted.old_value, Value::Number(6.0));
    assert_eq!(emitted.new_value, Value::Number(10.0));

    // Replaying the same changed cell with no write re-evaluates the same
    // inputs.
    let cells = [ChangedCell::new(table.id.clone(), record.clone(), a.id.clone())];
    for _ in 0..2 {
        let mut sink = Vec::<TableChanges>::new();
        let count = db
            .engine
            .run(&mut *db.conn, &cells, &mut Statements::new(), &mut sink)
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert!(sink.iter().all(|table| table.changes.is_empty()));
    }

    assert_eq!(db.cell(&double, &record).await, Value::Number(10.0));
}

tests!(rerun_without_mutation_emits_nothing);
