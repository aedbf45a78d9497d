use serde_json::json;
use tabula::{Config, FieldDef, GeneratedColumns, Type, Value};
use tests::{tests, DbTest};

/// A formula the backend cannot generate falls back to a computed column.
async fn unsupported_formula_falls_back(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let tags = db.field(FieldDef::stored(&table.id, "tags", Type::Json)).await;
    let record = db
        .insert(&table, vec![(&tags, Value::Json(json!(["a", "b"])))])
        .await;

    let joined = db
        .field(FieldDef::formula(&table.id, "joined", format!("ARRAY_JOIN({{{}}})", tags.id)).db_generated())
        .await;
    assert!(!joined.db_generated);

    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    let stored = catalog.field(&joined.id).unwrap();
    assert!(!stored.db_generated);
    // The request itself is kept with the formula.
    assert!(stored.formula_options().unwrap().db_generated);

    // Back-filled on creation, then kept current.
    assert_eq!(db.cell(&joined, &record).await, Value::from("a, b"));
    db.update(&table, &record, &tags, Value::Json(json!(["c"]))).await;
    assert_eq!(db.cell(&joined, &record).await, Value::from("c"));
}

async fn required_generation_fails_loudly(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let tags = db.field(FieldDef::stored(&table.id, "tags", Type::Json)).await;

    let err = db
        .try_field(
            FieldDef::formula(&table.id, "joined", format!("ARRAY_JOIN({{{}}})", tags.id))
                .require_generated(),
        )
        .await
        .unwrap_err();
    assert!(err.is_unsupported_function(), "{err}");

    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    assert!(catalog.table_fields(&table.id).all(|field| field.name != "joined"));
}

async fn required_generation_survives_formula_updates(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let tags = db.field(FieldDef::stored(&table.id, "tags", Type::Json)).await;
    let plus = db
        .field(FieldDef::formula(&table.id, "plus", format!("{{{}}} + 1", a.id)).require_generated())
        .await;
    assert!(plus.db_generated);
    assert!(plus.formula_options().unwrap().require_generated);

    let record = db.insert(&table, vec![(&a, Value::Number(1.0))]).await;

    let err = db
        .engine
        .definitions()
        .update_formula(&mut *db.conn, &plus.id, &format!("ARRAY_JOIN({{{}}})", tags.id))
        .await
        .unwrap_err();
    assert!(err.is_unsupported_function(), "{err}");

    let stored = db.reload(&plus).await;
    assert!(stored.db_generated);
    assert_eq!(stored.formula_options().unwrap().expression, format!("{{{}}} + 1", a.id));
    assert_eq!(db.cell(&plus, &record).await, Value::Number(2.0));
}

async fn generation_can_be_disabled(test: &mut DbTest) {
    let mut db = test
        .setup_db_with(Config::new().generated_columns(GeneratedColumns::Never))
        .await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let plus = db
        .field(FieldDef::formula(&table.id, "plus", format!("{{{}}} + 1", a.id)).db_generated())
        .await;
    assert!(!plus.db_generated);

    let record = db.insert(&table, vec![(&a, Value::Number(1.0))]).await;
    assert_eq!(db.cell(&plus, &record).await, Value::Number(2.0));
}

tests!(
    unsupported_formula_falls_back,
    required_generation_fails_loudly,
    required_generation_survives_formula_updates,
    generation_can_be_disabled,
);
