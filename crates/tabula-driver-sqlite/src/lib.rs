mod value;
pub(crate) use value::Value;

use rusqlite::Connection as RusqliteConnection;
use std::path::Path;
use tabula_core::{
    async_trait,
    driver::{
        operation::{Operation, QuerySql, Transaction},
        Capability, Connection, Flavor, Response,
    },
    Error, Result,
};
use tabula_sql::Serializer;
use url::Url;

/// A SQLite database holding tables, fields and the engine's metadata.
#[derive(Debug)]
pub struct Sqlite {
    connection: RusqliteConnection,
}

impl Sqlite {
    /// Opens the database named by a `sqlite:` URL. The path `:memory:`
    /// opens a fresh in-memory database.
    pub fn connect(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(Error::driver)?;

        if parsed.scheme() != "sqlite" {
            tabula_core::bail!("connection URL does not have a `sqlite` scheme; url={url}");
        }

        if parsed.path() == ":memory:" {
            Self::in_memory()
        } else {
            Self::open(parsed.path())
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Result<Self> {
        let connection = RusqliteConnection::open_in_memory().map_err(Error::driver)?;
        Ok(Self { connection })
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::driver)?;
        Ok(Self { connection })
    }

    fn transaction(&mut self, op: Transaction) -> Result<Response> {
        let sql = Serializer::new(Flavor::Sqlite).serialize_transaction(&op);
        self.connection.execute_batch(&sql).map_err(Error::driver)?;
        Ok(Response::count(0))
    }

    fn query_sql(&mut self, op: QuerySql) -> Result<Response> {
        tracing::trace!(sql = %op.sql, params = op.params.len(), "sqlite exec");

        let mut stmt = self
            .connection
            .prepare_cached(&op.sql)
            .map_err(|e| Error::driver(e).context(format!("sql={}", op.sql)))?;

        let params = op.params.into_iter().map(Value::from).collect::<Vec<_>>();

        let Some(ret_tys) = op.ret else {
            let count = stmt
                .execute(rusqlite::params_from_iter(params.iter()))
                .map_err(Error::driver)?;

            return Ok(Response::count(count as _));
        };

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver)?;

        let mut ret = vec![];

        while let Some(row) = rows.next().map_err(Error::driver)? {
            let mut items = Vec::with_capacity(ret_tys.len());

            for (index, ty) in ret_tys.iter().enumerate() {
                items.push(Value::from_sql(row, index, *ty)?.into_inner());
            }

            ret.push(items);
        }

        Ok(Response::values(ret))
    }
}

#[async_trait]
impl Connection for Sqlite {
    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::QuerySql(op) => self.query_sql(op),
            Operation::Transaction(op) => self.transaction(op),
        }
    }
}
