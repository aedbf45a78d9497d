use pretty_assertions::assert_eq;
use serde_json::json;
use tabula::{
    catalog::FIELD_META, BaseMutation, Closure, Config, Field, FieldDef, Relationship,
    RollupFunction, Statements, Type, Value,
};
use tabula_core::driver::Flavor;
use tabula_sql::serializer::quote_ident;
use tests::{change, tests, Db, DbTest};

/// Overwrites a field's stored options behind the engine's back.
async fn corrupt_options(db: &mut Db, flavor: Flavor, field: &Field, raw: &str) {
    let sql = format!(
        "UPDATE {} SET {} = '{}' WHERE {} = '{}'",
        quote_ident(flavor, FIELD_META),
        quote_ident(flavor, "options"),
        raw.replace('\'', "''"),
        quote_ident(flavor, "id"),
        field.id.as_str(),
    );
    let mut mutation = Statements::new().push(sql, vec![]);
    mutation.apply(&mut *db.conn).await.unwrap();
}

/// Changing a foreign title impacts exactly the host records linking to it.
async fn many_many_closure(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let host = db.table("Host").await;
    let foreign = db.table("Foreign").await;
    let host_title = db.field(FieldDef::stored(&host.id, "name", Type::Text)).await;
    let foreign_title = db.field(FieldDef::stored(&foreign.id, "name", Type::Text)).await;
    let link = db
        .field(
            FieldDef::link(&host.id, "foreign", &foreign.id, &foreign_title.id, Relationship::ManyMany)
                .symmetric(&host_title.id),
        )
        .await;

    let h1 = db.insert(&host, vec![(&host_title, Value::from("h1"))]).await;
    let h2 = db.insert(&host, vec![(&host_title, Value::from("h2"))]).await;
    let f1 = db.insert(&foreign, vec![(&foreign_title, Value::from("f1"))]).await;
    let f2 = db.insert(&foreign, vec![(&foreign_title, Value::from("f2"))]).await;

    db.set_links(&link, &h1, &[f1.clone()]).await;
    db.set_links(&link, &h2, &[f2.clone()]).await;

    let impact = db
        .engine
        .collect(&mut *db.conn, &foreign.id, &[(f1.clone(), foreign_title.id.clone())])
        .await
        .unwrap();

    let host_impact = impact.get(&host.id).unwrap();
    assert!(host_impact.records.contains(&h1));
    assert!(!host_impact.records.contains(&h2));
    assert!(host_impact.fields.contains(&link.id));

    let changes = db.update(&foreign, &f1, &foreign_title, "renamed").await;
    let emitted = change(&changes, &h1, &link).unwrap();
    assert_eq!(emitted.old_value, Value::Json(json!([{"id": f1.as_str(), "title": "f1"}])));
    assert_eq!(emitted.new_value, Value::Json(json!([{"id": f1.as_str(), "title": "renamed"}])));
    assert!(change(&changes, &h2, &link).is_none());

    assert_eq!(
        db.cell(&link, &h2).await,
        Value::Json(json!([{"id": f2.as_str(), "title": "f2"}]))
    );
}

/// Both sides of a link see an edit made through either side.
async fn mirrored_link_cells(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let projects = db.table("Projects").await;
    let tasks = db.table("Tasks").await;
    let project_name = db.field(FieldDef::stored(&projects.id, "name", Type::Text)).await;
    let task_name = db.field(FieldDef::stored(&tasks.id, "name", Type::Text)).await;
    let link = db
        .field(
            FieldDef::link(&projects.id, "tasks", &tasks.id, &task_name.id, Relationship::OneMany)
                .symmetric(&project_name.id),
        )
        .await;

    let link = db.reload(&link).await;
    let mirrored_id = link.link_options().unwrap().symmetric_field_id.unwrap();
    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    let mirrored = catalog.field(&mirrored_id).unwrap().clone();
    assert_eq!(mirrored.table, tasks.id);
    assert_eq!(
        mirrored.link_options().unwrap().relationship,
        Relationship::ManyOne
    );

    let p1 = db.insert(&projects, vec![(&project_name, Value::from("P1"))]).await;
    let p2 = db.insert(&projects, vec![(&project_name, Value::from("P2"))]).await;
    let t1 = db.insert(&tasks, vec![(&task_name, Value::from("T1"))]).await;

    let changes = db.set_links(&link, &p1, &[t1.clone()]).await;
    assert_eq!(
        change(&changes, &t1, &mirrored).unwrap().new_value,
        Value::Json(json!([{"id": p1.as_str(), "title": "P1"}]))
    );

    // Moving the task through the mirrored side unlinks it from P1.
    let changes = db.set_links(&mirrored, &t1, &[p2.clone()]).await;
    assert_eq!(change(&changes, &p1, &link).unwrap().new_value, Value::Null);
    assert_eq!(
        change(&changes, &p2, &link).unwrap().new_value,
        Value::Json(json!([{"id": t1.as_str(), "title": "T1"}]))
    );
    assert_eq!(db.cell(&link, &p1).await, Value::Null);
}

async fn lookups_and_rollups(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let projects = db.table("Projects").await;
    let tasks = db.table("Tasks").await;
    let project_name = db.field(FieldDef::stored(&projects.id, "name", Type::Text)).await;
    let task_name = db.field(FieldDef::stored(&tasks.id, "name", Type::Text)).await;
    let hours = db.field(FieldDef::stored(&tasks.id, "hours", Type::Number)).await;
    let link = db
        .field(FieldDef::link(
            &projects.id,
            "tasks",
            &tasks.id,
            &task_name.id,
            Relationship::ManyMany,
        ))
        .await;
    let total = db
        .field(FieldDef::rollup(&projects.id, "total", &link.id, &hours.id, RollupFunction::Sum))
        .await;
    let count = db
        .field(FieldDef::rollup(&projects.id, "count", &link.id, &hours.id, RollupFunction::Count))
        .await;
    let names = db
        .field(FieldDef::lookup(&projects.id, "names", &link.id, &task_name.id))
        .await;
    let summary = db
        .field(FieldDef::formula(
            &projects.id,
            "summary",
            format!("{{{}}} * 2", total.id),
        ))
        .await;

    let p1 = db.insert(&projects, vec![(&project_name, Value::from("P1"))]).await;
    let t1 = db
        .insert(&tasks, vec![(&task_name, Value::from("a")), (&hours, Value::Number(2.0))])
        .await;
    let t2 = db
        .insert(&tasks, vec![(&task_name, Value::from("b")), (&hours, Value::Number(3.0))])
        .await;

    assert_eq!(db.cell(&total, &p1).await, Value::Null);
    assert_eq!(db.cell(&names, &p1).await, Value::Null);

    db.set_links(&link, &p1, &[t1.clone(), t2.clone()]).await;
    assert_eq!(db.cell(&total, &p1).await, Value::Number(5.0));
    assert_eq!(db.cell(&count, &p1).await, Value::Number(2.0));
    assert_eq!(db.cell(&summary, &p1).await, Value::Number(10.0));

    let Value::Json(names_json) = db.cell(&names, &p1).await else {
        panic!("lookup is not an array");
    };
    let mut looked_up: Vec<String> = serde_json::from_value(names_json).unwrap();
    looked_up.sort();
    assert_eq!(looked_up, vec!["a".to_string(), "b".to_string()]);

    let changes = db.update(&tasks, &t1, &hours, 10.0).await;
    let emitted = change(&changes, &p1, &total).unwrap();
    assert_eq!(emitted.old_value, Value::Number(5.0));
    assert_eq!(emitted.new_value, Value::Number(13.0));
    assert_eq!(
        change(&changes, &p1, &summary).unwrap().new_value,
        Value::Number(26.0)
    );
    // The count did not move.
    assert!(change(&changes, &p1, &count).is_none());
}

/// Closing over the references in one recursive query reaches the same
/// fields as walking them in memory.
async fn recursive_closure(test: &mut DbTest) {
    let mut db = test
        .setup_db_with(Config::new().closure(Closure::RecursiveQuery))
        .await;

    let table = db.table("Items").await;
    let a = db.field(FieldDef::stored(&table.id, "a", Type::Number)).await;
    let f1 = db
        .field(FieldDef::formula(&table.id, "f1", format!("{{{}}} + 1", a.id)))
        .await;
    let f2 = db
        .field(FieldDef::formula(&table.id, "f2", format!("{{{}}} * 2", f1.id)))
        .await;
    let unrelated = db.field(FieldDef::formula(&table.id, "unrelated", "1 + 1")).await;

    let record = db.insert(&table, vec![(&a, Value::Number(1.0))]).await;

    let impact = db
        .engine
        .collect(&mut *db.conn, &table.id, &[(record.clone(), a.id.clone())])
        .await
        .unwrap();
    let fields = &impact.get(&table.id).unwrap().fields;
    assert!(fields.contains(&f1.id));
    assert!(fields.contains(&f2.id));
    assert!(!fields.contains(&unrelated.id));

    let changes = db.update(&table, &record, &a, 2.0).await;
    assert_eq!(change(&changes, &record, &f2).unwrap().new_value, Value::Number(6.0));
}

/// A one-to-one target linked from a new record leaves its previous one.
async fn one_one_links_stay_single(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let people = db.table("People").await;
    let desks = db.table("Desks").await;
    let person_name = db.field(FieldDef::stored(&people.id, "name", Type::Text)).await;
    let desk_name = db.field(FieldDef::stored(&desks.id, "name", Type::Text)).await;
    let desk = db
        .field(
            FieldDef::link(&people.id, "desk", &desks.id, &desk_name.id, Relationship::OneOne)
                .symmetric(&person_name.id),
        )
        .await;

    let desk = db.reload(&desk).await;
    let occupant_id = desk.link_options().unwrap().symmetric_field_id.unwrap();
    let catalog = db.engine.catalog(&mut *db.conn).await.unwrap();
    let occupant = catalog.field(&occupant_id).unwrap().clone();
    assert_eq!(
        occupant.link_options().unwrap().relationship,
        Relationship::OneOne
    );

    let ada = db.insert(&people, vec![(&person_name, Value::from("Ada"))]).await;
    let bob = db.insert(&people, vec![(&person_name, Value::from("Bob"))]).await;
    let d1 = db.insert(&desks, vec![(&desk_name, Value::from("d1"))]).await;
    let d2 = db.insert(&desks, vec![(&desk_name, Value::from("d2"))]).await;

    db.set_links(&desk, &ada, &[d1.clone()]).await;

    // Bob takes d1; Ada is left without a desk.
    let changes = db.set_links(&desk, &bob, &[d1.clone()]).await;
    let released = change(&changes, &ada, &desk).unwrap();
    assert_eq!(released.old_value, Value::Json(json!([{"id": d1.as_str(), "title": "d1"}])));
    assert_eq!(released.new_value, Value::Null);
    assert_eq!(db.cell(&desk, &ada).await, Value::Null);
    assert_eq!(
        db.cell(&desk, &bob).await,
        Value::Json(json!([{"id": d1.as_str(), "title": "d1"}]))
    );
    assert_eq!(
        db.cell(&occupant, &d1).await,
        Value::Json(json!([{"id": bob.as_str(), "title": "Bob"}]))
    );

    // Moving Bob through the mirrored side frees d1.
    let changes = db.set_links(&occupant, &d2, &[bob.clone()]).await;
    assert_eq!(change(&changes, &d1, &occupant).unwrap().new_value, Value::Null);
    assert_eq!(
        change(&changes, &bob, &desk).unwrap().new_value,
        Value::Json(json!([{"id": d2.as_str(), "title": "d2"}]))
    );
    assert_eq!(db.cell(&occupant, &d1).await, Value::Null);
}

/// An edit travels across two link hops until no new record is reached.
async fn two_hop_rollups(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let regions = db.table("Regions").await;
    let stores = db.table("Stores").await;
    let sales = db.table("Sales").await;
    let region_name = db.field(FieldDef::stored(&regions.id, "name", Type::Text)).await;
    let store_name = db.field(FieldDef::stored(&stores.id, "name", Type::Text)).await;
    let sale_name = db.field(FieldDef::stored(&sales.id, "name", Type::Text)).await;
    let amount = db.field(FieldDef::stored(&sales.id, "amount", Type::Number)).await;

    let store_sales = db
        .field(FieldDef::link(&stores.id, "sales", &sales.id, &sale_name.id, Relationship::ManyMany))
        .await;
    let store_total = db
        .field(FieldDef::rollup(&stores.id, "total", &store_sales.id, &amount.id, RollupFunction::Sum))
        .await;
    let region_stores = db
        .field(FieldDef::link(
            &regions.id,
            "stores",
            &stores.id,
            &store_name.id,
            Relationship::ManyMany,
        ))
        .await;
    let region_total = db
        .field(FieldDef::rollup(
            &regions.id,
            "total",
            &region_stores.id,
            &store_total.id,
            RollupFunction::Sum,
        ))
        .await;

    let north = db.insert(&regions, vec![(&region_name, Value::from("north"))]).await;
    let south = db.insert(&regions, vec![(&region_name, Value::from("south"))]).await;
    let s1 = db.insert(&stores, vec![(&store_name, Value::from("s1"))]).await;
    let s2 = db.insert(&stores, vec![(&store_name, Value::from("s2"))]).await;
    let s3 = db.insert(&stores, vec![(&store_name, Value::from("s3"))]).await;
    let x = db
        .insert(&sales, vec![(&sale_name, Value::from("x")), (&amount, Value::Number(2.0))])
        .await;
    let y = db
        .insert(&sales, vec![(&sale_name, Value::from("y")), (&amount, Value::Number(3.0))])
        .await;
    let z = db
        .insert(&sales, vec![(&sale_name, Value::from("z")), (&amount, Value::Number(7.0))])
        .await;

    db.set_links(&store_sales, &s1, &[x.clone(), y.clone()]).await;
    db.set_links(&store_sales, &s2, &[y.clone()]).await;
    db.set_links(&store_sales, &s3, &[z.clone()]).await;
    db.set_links(&region_stores, &north, &[s1.clone(), s2.clone()]).await;
    db.set_links(&region_stores, &south, &[s3.clone()]).await;
    assert_eq!(db.cell(&region_total, &north).await, Value::Number(8.0));

    let changes = db.update(&sales, &y, &amount, 10.0).await;
    assert_eq!(change(&changes, &s1, &store_total).unwrap().new_value, Value::Number(12.0));
    assert_eq!(change(&changes, &s2, &store_total).unwrap().new_value, Value::Number(10.0));

    let emitted = change(&changes, &north, &region_total).unwrap();
    assert_eq!(emitted.old_value, Value::Number(8.0));
    assert_eq!(emitted.new_value, Value::Number(22.0));

    assert!(change(&changes, &s3, &store_total).is_none());
    assert!(change(&changes, &south, &region_total).is_none());
    assert_eq!(db.cell(&region_total, &south).await, Value::Number(7.0));
}

/// Fields whose stored metadata no longer decodes are left alone while
/// their siblings still update.
async fn unreadable_fields_are_skipped(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let projects = db.table("Projects").await;
    let tasks = db.table("Tasks").await;
    let project_name = db.field(FieldDef::stored(&projects.id, "name", Type::Text)).await;
    let task_name = db.field(FieldDef::stored(&tasks.id, "name", Type::Text)).await;
    let hours = db.field(FieldDef::stored(&tasks.id, "hours", Type::Number)).await;
    let link = db
        .field(FieldDef::link(&projects.id, "tasks", &tasks.id, &task_name.id, Relationship::ManyMany))
        .await;
    let total = db
        .field(FieldDef::rollup(&projects.id, "total", &link.id, &hours.id, RollupFunction::Sum))
        .await;
    let peak = db
        .field(FieldDef::rollup(&projects.id, "peak", &link.id, &hours.id, RollupFunction::Max))
        .await;
    let doubled = db
        .field(FieldDef::formula(&projects.id, "doubled", format!("{{{}}} * 2", total.id)))
        .await;

    let p1 = db.insert(&projects, vec![(&project_name, Value::from("P1"))]).await;
    let t1 = db
        .insert(&tasks, vec![(&task_name, Value::from("a")), (&hours, Value::Number(2.0))])
        .await;
    db.set_links(&link, &p1, &[t1.clone()]).await;
    assert_eq!(db.cell(&peak, &p1).await, Value::Number(2.0));
    assert_eq!(db.cell(&doubled, &p1).await, Value::Number(4.0));

    let flavor = test.capability().flavor;
    corrupt_options(&mut db, flavor, &peak, "not json").await;
    corrupt_options(&mut db, flavor, &doubled, r#"{"expression":"{broken} *"}"#).await;

    let changes = db.update(&tasks, &t1, &hours, 5.0).await;
    assert_eq!(change(&changes, &p1, &total).unwrap().new_value, Value::Number(5.0));
    assert!(change(&changes, &p1, &peak).is_none());
    assert!(change(&changes, &p1, &doubled).is_none());

    assert_eq!(db.cell(&total, &p1).await, Value::Number(5.0));
    assert_eq!(db.cell(&peak, &p1).await, Value::Number(2.0));
    assert_eq!(db.cell(&doubled, &p1).await, Value::Number(4.0));
}

tests!(
    many_many_closure,
    mirrored_link_cells,
    lookups_and_rollups,
    recursive_closure,
    one_one_links_stay_single,
    two_hop_rollups,
    unreadable_fields_are_skipped,
);
