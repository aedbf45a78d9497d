use pretty_assertions::assert_eq;
use tabula_core::{Type, Value};
use tabula_sql::{
    stmt::{ColumnDef, Expr, Statement},
    Serializer,
};

fn serialize(stmt: &Statement, flavor: &str) -> String {
    let serializer = match flavor {
        "sqlite" => Serializer::sqlite(),
        "postgresql" => Serializer::postgresql(),
        _ => panic!("unknown flavor: {flavor}"),
    };
    let mut params: Vec<Value> = vec![];
    serializer.serialize(stmt, &mut params)
}

fn record_table() -> Statement {
    Statement::create_table(
        "orders",
        vec![
            ColumnDef::new("__id", Type::Text).primary_key(),
            ColumnDef::new("__version", Type::Integer)
                .not_null()
                .default(Expr::raw("1")),
            ColumnDef::new("amount", Type::Number),
        ],
    )
}

#[test]
fn create_record_table_sqlite() {
    assert_eq!(
        serialize(&record_table(), "sqlite"),
        "CREATE TABLE `orders` (`__id` TEXT PRIMARY KEY, `__version` INTEGER NOT NULL DEFAULT 1, `amount` REAL);"
    );
}

#[test]
fn create_record_table_postgresql() {
    assert_eq!(
        serialize(&record_table(), "postgresql"),
        r#"CREATE TABLE "orders" ("__id" TEXT PRIMARY KEY, "__version" BIGINT NOT NULL DEFAULT 1, "amount" DOUBLE PRECISION);"#
    );
}

#[test]
fn add_generated_column() {
    let stored = Statement::add_column(
        "orders",
        ColumnDef::new("total", Type::Number).generated(r#"("amount" * 2)"#, true),
    );
    assert_eq!(
        serialize(&stored, "postgresql"),
        r#"ALTER TABLE "orders" ADD COLUMN "total" DOUBLE PRECISION GENERATED ALWAYS AS (("amount" * 2)) STORED;"#
    );

    let virtual_ = Statement::add_column(
        "orders",
        ColumnDef::new("total", Type::Number).generated("(`amount` * 2)", false),
    );
    assert_eq!(
        serialize(&virtual_, "sqlite"),
        "ALTER TABLE `orders` ADD COLUMN `total` REAL GENERATED ALWAYS AS ((`amount` * 2)) VIRTUAL;"
    );
}

#[test]
fn drop_column_and_table() {
    assert_eq!(
        serialize(&Statement::drop_column("orders", "total"), "sqlite"),
        "ALTER TABLE `orders` DROP COLUMN `total`;"
    );
    assert_eq!(
        serialize(&Statement::drop_table_if_exists("junction_fldL"), "postgresql"),
        r#"DROP TABLE IF EXISTS "junction_fldL";"#
    );
}

#[test]
fn create_index() {
    let stmt = Statement::create_index(
        "idx_junction_fldL_self_key",
        "junction_fldL",
        vec!["self_key".to_string()],
    );
    assert_eq!(
        serialize(&stmt, "sqlite"),
        "CREATE INDEX IF NOT EXISTS `idx_junction_fldL_self_key` ON `junction_fldL` (`self_key`);"
    );
}
