use tabula::{FieldDef, Type};
use tests::{tests, DbTest};

async fn cycles_are_rejected(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let f1 = db
        .field(FieldDef::formula(&table.id, "f1", format!("{{{}}} + 1", a.id)))
        .await;
    let f2 = db
        .field(FieldDef::formula(&table.id, "f2", format!("{{{}}} + 1", f1.id)))
        .await;

    let err = db
        .engine
        .definitions()
        .update_formula(&mut *db.conn, &f1.id, &format!("{{{}}} + 1", f2.id))
        .await
        .unwrap_err();
    assert!(err.is_circular_reference(), "{err}");
    assert!(err.is_definition_error());

    // The rejected edit left the formula untouched.
    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    let options = catalog.field(&f1.id).unwrap().formula_options().unwrap();
    assert_eq!(options.expression, format!("{{{}}} + 1", a.id));
}

async fn self_reference_is_rejected(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let err = db
        .try_field(FieldDef::formula(&table.id, "loop", "{fldLoop} + 1").id("fldLoop"))
        .await
        .unwrap_err();
    assert!(err.is_circular_reference(), "{err}");

    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    assert_eq!(catalog.table_fields(&table.id).count(), 0);
}

async fn unknown_references_are_rejected(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let err = db
        .try_field(FieldDef::formula(&table.id, "f", "{fldMissing} + 1"))
        .await
        .unwrap_err();
    assert!(err.is_unknown_field(), "{err}");
}

tests!(
    cycles_are_rejected,
    self_reference_is_rejected,
    unknown_references_are_rejected,
);
