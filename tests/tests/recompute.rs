use tabula::{BaseMutation, Config, FieldDef, RecomputeStats, Statements, Type, Value};
use tabula_sql::serializer::quote_ident;
use tests::{tests, DbTest};

async fn recompute_pages_through_every_record(test: &mut DbTest) {
    let mut db = test.setup_db_with(Config::new().page_size(2)).await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let tens = db
        .field(FieldDef::formula(&table.id, "tens", format!("{{{}}} * 10", a.id)))
        .await;
    let plus = db
        .field(FieldDef::formula(&table.id, "plus", format!("{{{}}} + 1", tens.id)))
        .await;

    let mut records = vec![];
    for i in 0..5 {
        records.push(db.insert(&table, vec![(&a, Value::Number(i as f64))]).await);
    }

    // Overwrite `a` behind the engine's back; only a recompute catches up.
    let flavor = test.capability().flavor;
    let sql = format!(
        "UPDATE {} SET {} = 100",
        quote_ident(flavor, &table.db_table_name),
        quote_ident(flavor, &a.db_column)
    );
    let mut overwrite = Statements::new().push(sql, vec![]);
    overwrite.apply(&mut *db.conn).await.unwrap();

    let stats = db.engine.recompute(&mut *db.conn, [tens.id.clone()]).await.unwrap();
    assert_eq!(
        stats,
        RecomputeStats {
            fields: 2,
            pages: 6,
            records: 10,
        }
    );

    for record in &records {
        assert_eq!(db.cell(&tens, record).await, Value::Number(1000.0));
        assert_eq!(db.cell(&plus, record).await, Value::Number(1001.0));
    }
}

async fn recompute_of_empty_table(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let tens = db
        .field(FieldDef::formula(&table.id, "tens", format!("{{{}}} * 10", a.id)))
        .await;

    let stats = db.engine.recompute(&mut *db.conn, [tens.id.clone()]).await.unwrap();
    assert_eq!(stats.pages, 0);
    assert_eq!(stats.records, 0);
    assert_eq!(stats.fields, 1);
}

tests!(recompute_pages_through_every_record, recompute_of_empty_table);
