use tabula::{
    catalog::Catalog, BaseMutation, ChangedCell, Connection, FieldDef, Result, TableChanges, Type,
    UpdateCells, Value,
};
use tests::{tests, DbTest};

/// Writes its cells, then fails.
struct FailingUpdate(UpdateCells);

#[async_trait::async_trait]
impl BaseMutation for FailingUpdate {
    async fn apply(&mut self, conn: &mut dyn Connection) -> Result<()> {
        self.0.apply(conn).await?;
        tabula_core::bail!("mutation failed after writing");
    }

    async fn changes(&self, conn: &mut dyn Connection, catalog: &Catalog) -> Result<Vec<ChangedCell>> {
        self.0.changes(conn, catalog).await
    }
}

async fn failed_mutation_rolls_back(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let double = db
        .field(FieldDef::formula(&table.id, "double", format!("{{{}}} * 2", a.id)))
        .await;
    let record = db.insert(&table, vec![(&a, Value::Number(1.0))]).await;
    let version = db.version(&table, &record).await;

    let mut mutation = FailingUpdate(UpdateCells::new(&table).set(record.clone(), &a, 50.0));
    let mut sink = Vec::<TableChanges>::new();
    let err = db
        .engine
        .run(&mut *db.conn, &[], &mut mutation, &mut sink)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("mutation failed after writing"));

    // Nothing was emitted and nothing was kept.
    assert!(sink.is_empty());
    assert_eq!(db.cell(&a, &record).await, Value::Number(1.0));
    assert_eq!(db.cell(&double, &record).await, Value::Number(2.0));
    assert_eq!(db.version(&table, &record).await, version);

    // The connection is usable afterwards.
    db.update(&table, &record, &a, 4.0).await;
    assert_eq!(db.cell(&double, &record).await, Value::Number(8.0));
}

async fn failed_definition_rolls_back(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;

    let err = db
        .try_field(FieldDef::formula(&table.id, "broken", format!("{{{}}} +", a.id)))
        .await
        .unwrap_err();
    assert!(err.is_invalid_formula(), "{err}");

    // A later field with the same name goes through.
    db.field(FieldDef::formula(&table.id, "broken", format!("{{{}}} + 1", a.id)))
        .await;

    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    assert_eq!(catalog.table_fields(&table.id).count(), 2);
}

tests!(failed_mutation_rolls_back, failed_definition_rolls_back);
