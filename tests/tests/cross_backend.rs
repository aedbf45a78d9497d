use tabula::{FieldDef, Type, Value};
use tests::{tests, DbTest};

async fn sum_of_fields_and_literal(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let b = db.field(FieldDef::stored(&table.id, "b", Type::Number)).await;
    let total = db
        .field(FieldDef::formula(
            &table.id,
            "total",
            format!("SUM({{{}}}, {{{}}}, 10)", a.id, b.id),
        ))
        .await;

    let record = db
        .insert(&table, vec![(&a, Value::Number(1.5)), (&b, Value::Number(2.0))])
        .await;
    assert_eq!(db.cell(&total, &record).await, Value::Number(13.5));

    // Empty cells count as zero.
    let empty = db.insert(&table, vec![(&a, Value::Number(4.0))]).await;
    assert_eq!(db.cell(&total, &empty).await, Value::Number(14.0));
}

async fn concatenate_text(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("People").await;
    let first = db.field(FieldDef::stored(&table.id, "first", Type::Text)).await;
    let last = db.field(FieldDef::stored(&table.id, "last", Type::Text)).await;
    let full = db
        .field(FieldDef::formula(
            &table.id,
            "full",
            format!("CONCATENATE({{{}}}, \" - \", {{{}}})", first.id, last.id),
        ))
        .await;

    let record = db
        .insert(
            &table,
            vec![(&first, Value::from("Ada")), (&last, Value::from("Lovelace"))],
        )
        .await;
    assert_eq!(db.cell(&full, &record).await, Value::from("Ada - Lovelace"));

    db.update(&table, &record, &last, "Byron").await;
    assert_eq!(db.cell(&full, &record).await, Value::from("Ada - Byron"));
}

async fn conditional_rounding(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let f1 = db.field(FieldDef::stored(&table.id, "f1", Type::Number)).await;
    let f2 = db.field(FieldDef::stored(&table.id, "f2", Type::Number)).await;
    let f5 = db.field(FieldDef::stored(&table.id, "f5", Type::Number)).await;
    let result = db
        .field(FieldDef::formula(
            &table.id,
            "result",
            format!(
                "IF(SUM({{{}}},{{{}}}) > 100, ROUND({{{}}},2), 0)",
                f1.id, f2.id, f5.id
            ),
        ))
        .await;

    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    let mut dependencies: Vec<_> = catalog.graph().dependencies(&result.id).into_iter().collect();
    dependencies.sort();
    let mut expected = vec![f1.id.clone(), f2.id.clone(), f5.id.clone()];
    expected.sort();
    assert_eq!(dependencies, expected);

    let record = db
        .insert(
            &table,
            vec![
                (&f1, Value::Number(60.0)),
                (&f2, Value::Number(50.0)),
                (&f5, Value::Number(3.14159)),
            ],
        )
        .await;
    assert_eq!(db.cell(&result, &record).await, Value::Number(3.14));

    db.update(&table, &record, &f1, 10.0).await;
    assert_eq!(db.cell(&result, &record).await, Value::Number(0.0));
}

async fn text_to_number(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Readings").await;
    let raw = db.field(FieldDef::stored(&table.id, "raw", Type::Text)).await;
    let parsed = db
        .field(FieldDef::formula(
            &table.id,
            "parsed",
            format!("VALUE({{{}}})", raw.id),
        ))
        .await;

    let record = db.insert(&table, vec![(&raw, Value::from(" 12.5 "))]).await;
    assert_eq!(db.cell(&parsed, &record).await, Value::Number(12.5));

    // Text that is not a number converts to an empty cell without failing
    // the edit.
    db.update(&table, &record, &raw, "abc").await;
    assert_eq!(db.cell(&parsed, &record).await, Value::Null);

    db.update(&table, &record, &raw, "-3e2").await;
    assert_eq!(db.cell(&parsed, &record).await, Value::Number(-300.0));

    db.update(&table, &record, &raw, "").await;
    assert_eq!(db.cell(&parsed, &record).await, Value::Null);
}

tests!(
    sum_of_fields_and_literal,
    concatenate_text,
    conditional_rounding,
    text_to_number,
);
