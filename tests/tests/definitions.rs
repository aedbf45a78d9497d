use pretty_assertions::assert_eq;
use tabula::{FieldDef, FieldKind, Relationship, Type, Value};
use tests::{tests, DbTest};

async fn new_fields_are_back_filled(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let r1 = db.insert(&table, vec![(&a, Value::Number(1.0))]).await;
    let r2 = db.insert(&table, vec![(&a, Value::Number(2.0))]).await;

    let plus = db
        .field(FieldDef::formula(&table.id, "plus", format!("{{{}}} + 1", a.id)))
        .await;
    assert_eq!(plus.kind, FieldKind::Formula);
    assert_eq!(plus.ty, Type::Number);
    assert!(plus.is_computed);

    assert_eq!(db.cell(&plus, &r1).await, Value::Number(2.0));
    assert_eq!(db.cell(&plus, &r2).await, Value::Number(3.0));
}

async fn formula_edit_recomputes(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let b = db.field(FieldDef::stored(&table.id, "b", Type::Text)).await;
    let f = db
        .field(FieldDef::formula(&table.id, "f", format!("{{{}}} * 2", a.id)))
        .await;

    let record = db
        .insert(&table, vec![(&a, Value::Number(3.0)), (&b, Value::from("x"))])
        .await;
    assert_eq!(db.cell(&f, &record).await, Value::Number(6.0));

    // Switching to a text result changes the column type.
    let f = db
        .engine
        .definitions()
        .update_formula(&mut *db.conn, &f.id, &format!("CONCATENATE({{{}}}, \"!\")", b.id))
        .await
        .unwrap();
    assert_eq!(f.ty, Type::Text);
    assert_eq!(db.cell(&f, &record).await, Value::from("x!"));

    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    let graph = catalog.graph();
    assert!(graph.dependencies(&f.id).contains(&b.id));
    assert!(!graph.dependencies(&f.id).contains(&a.id));

    // Editing `a` no longer reaches `f`.
    let changes = db.update(&table, &record, &a, 10.0).await;
    assert!(tests::change(&changes, &record, &f).is_none());
}

async fn delete_cascades_to_dependents(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let other = db.field(FieldDef::stored(&table.id, "other", Type::Number)).await;
    let f1 = db
        .field(FieldDef::formula(&table.id, "f1", format!("{{{}}} + 1", a.id)))
        .await;
    let f2 = db
        .field(FieldDef::formula(&table.id, "f2", format!("{{{}}} * 2", f1.id)))
        .await;
    let record = db.insert(&table, vec![(&a, Value::Number(1.0))]).await;

    let deleted = db
        .engine
        .definitions()
        .delete_field(&mut *db.conn, &a.id)
        .await
        .unwrap();
    assert_eq!(deleted, vec![f2.id.clone(), f1.id.clone(), a.id.clone()]);

    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    let remaining: Vec<_> = catalog.table_fields(&table.id).map(|field| field.id.clone()).collect();
    assert_eq!(remaining, vec![other.id.clone()]);
    assert!(catalog
        .references()
        .iter()
        .all(|reference| reference.from != a.id && reference.from != f1.id));

    // The table keeps working without the dropped columns.
    db.update(&table, &record, &other, 5.0).await;
    assert_eq!(db.cell(&other, &record).await, Value::Number(5.0));
}

async fn deleting_a_link_removes_its_mirror(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let host = db.table("Host").await;
    let foreign = db.table("Foreign").await;
    let host_title = db.field(FieldDef::stored(&host.id, "name", Type::Text)).await;
    let foreign_title = db.field(FieldDef::stored(&foreign.id, "name", Type::Text)).await;

    for relationship in [Relationship::ManyMany, Relationship::ManyOne] {
        let link = db
            .field(
                FieldDef::link(&host.id, "link", &foreign.id, &foreign_title.id, relationship)
                    .symmetric(&host_title.id),
            )
            .await;
        let link = db.reload(&link).await;
        let mirrored = link.link_options().unwrap().symmetric_field_id.unwrap();

        let deleted = db
            .engine
            .definitions()
            .delete_field(&mut *db.conn, &link.id)
            .await
            .unwrap();
        assert!(deleted.contains(&link.id));
        assert!(deleted.contains(&mirrored));

        let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
        assert!(catalog.get_field(&link.id).is_none());
        assert!(catalog.get_field(&mirrored).is_none());
    }

    // The titles outlive the links.
    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    assert!(catalog.get_field(&host_title.id).is_some());
    assert!(catalog.get_field(&foreign_title.id).is_some());
}

tests!(
    new_fields_are_back_filled,
    formula_edit_recomputes,
    delete_cascades_to_dependents,
    deleting_a_link_removes_its_mirror,
);
