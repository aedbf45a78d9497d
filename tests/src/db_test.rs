use crate::Setup;

use std::{future::Future, panic::AssertUnwindSafe, pin::Pin};
use tabula::{
    BaseMutation, Config, Connection, Engine, Field, FieldDef, InsertRecords, RecordId, Result,
    SetLinks, Table, TableChanges, UpdateCells, Value,
};
use tabula_core::{
    driver::{operation::QuerySql, Capability},
    schema::{ID_COLUMN, VERSION_COLUMN},
    Type,
};
use tabula_sql::{
    stmt::{Expr, Select, TableRef},
    Serializer, Statement,
};

/// Drives one test against one backend.
///
/// Tests are plain `#[test]` functions; the runtime is created here so the
/// backend's cleanup still runs when the test body panics.
pub struct DbTest {
    setup: Box<dyn Setup>,
}

impl DbTest {
    pub fn new(setup: Box<dyn Setup>) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Self { setup }
    }

    pub fn capability(&self) -> &'static Capability {
        self.setup.capability()
    }

    /// Connects to a fresh database with the metadata tables installed.
    pub async fn setup_db(&mut self) -> Db {
        self.setup_db_with(Config::default()).await
    }

    pub async fn setup_db_with(&mut self, config: Config) -> Db {
        let mut conn = self.setup.connect().await.unwrap();
        let engine = Engine::new(config);
        engine.install(&mut *conn).await.unwrap();
        Db { engine, conn }
    }

    pub fn run_test<F>(mut self, test_fn: F)
    where
        F: for<'a> FnOnce(&'a mut DbTest) -> Pin<Box<dyn Future<Output = ()> + 'a>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create Tokio runtime");

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            runtime.block_on(test_fn(&mut self));
        }));

        if let Err(err) = runtime.block_on(self.setup.cleanup()) {
            eprintln!("cleanup failed: {err}");
        }

        if let Err(panic) = result {
            std::panic::resume_unwind(panic);
        }
    }
}

/// An engine and the connection it runs against.
pub struct Db {
    pub engine: Engine,
    pub conn: Box<dyn Connection>,
}

impl Db {
    pub fn conn(&mut self) -> &mut dyn Connection {
        &mut *self.conn
    }

    pub async fn table(&mut self, name: &str) -> Table {
        self.engine
            .definitions()
            .create_table(&mut *self.conn, name)
            .await
            .unwrap()
    }

    pub async fn try_field(&mut self, def: FieldDef) -> Result<Field> {
        self.engine
            .definitions()
            .create_field(&mut *self.conn, def)
            .await
    }

    pub async fn field(&mut self, def: FieldDef) -> Field {
        self.try_field(def).await.unwrap()
    }

    /// Reloads a field, e.g. to see the mirrored side of a link.
    pub async fn reload(&mut self, field: &Field) -> Field {
        let catalog = self.engine.catalog(&mut *self.conn).await.unwrap();
        catalog.field(&field.id).unwrap().clone()
    }

    pub async fn run(&mut self, mutation: &mut dyn BaseMutation) -> Result<Vec<TableChanges>> {
        let mut sink = Vec::<TableChanges>::new();
        self.engine
            .run(&mut *self.conn, &[], mutation, &mut sink)
            .await?;
        Ok(sink)
    }

    /// Inserts one record and propagates it.
    pub async fn insert(&mut self, table: &Table, cells: Vec<(&Field, Value)>) -> RecordId {
        let mut mutation = InsertRecords::new(table);
        let record = mutation.record(cells);
        self.run(&mut mutation).await.unwrap();
        record
    }

    pub async fn update(
        &mut self,
        table: &Table,
        record: &RecordId,
        field: &Field,
        value: impl Into<Value>,
    ) -> Vec<TableChanges> {
        let mut mutation = UpdateCells::new(table).set(record.clone(), field, value);
        self.run(&mut mutation).await.unwrap()
    }

    pub async fn set_links(
        &mut self,
        link: &Field,
        host: &RecordId,
        foreign: &[RecordId],
    ) -> Vec<TableChanges> {
        let mut mutation = SetLinks::new(link, host.clone(), foreign.iter().cloned()).unwrap();
        self.run(&mut mutation).await.unwrap()
    }

    /// Reads the stored value of one cell.
    pub async fn cell(&mut self, field: &Field, record: &RecordId) -> Value {
        let catalog = self.engine.catalog(&mut *self.conn).await.unwrap();
        let table = catalog.table(&field.table).unwrap();

        let mut rows = self
            .select(&table.db_table_name, &field.db_column, record, field.ty)
            .await;

        assert_eq!(rows.len(), 1, "record {record} not found");
        rows.remove(0).remove(0)
    }

    /// Reads the version column of a record.
    pub async fn version(&mut self, table: &Table, record: &RecordId) -> i64 {
        let rows = self
            .select(&table.db_table_name, VERSION_COLUMN, record, Type::Integer)
            .await;

        rows[0][0].as_i64().unwrap()
    }

    async fn select(&mut self, table: &str, column: &str, record: &RecordId, ty: Type) -> Vec<Vec<Value>> {
        let stmt: Statement = Select::from(TableRef::new(table))
            .column(Expr::column(column))
            .filter(Expr::eq(Expr::column(ID_COLUMN), Expr::value(record.as_str())))
            .into();

        let mut params = Vec::<Value>::new();
        let sql = Serializer::new(self.conn.capability().flavor).serialize(&stmt, &mut params);

        self.conn
            .exec(QuerySql::query(sql, params, vec![ty]).into())
            .await
            .unwrap()
            .into_values()
    }
}
