mod value;
pub(crate) use value::Value;

use postgres_types::ToSql;
use tabula_core::{
    async_trait, bail,
    driver::{
        operation::{Operation, QuerySql, Transaction},
        Capability, Connection, Flavor, Response,
    },
    Error, Result,
};
use tabula_sql::Serializer;
use tokio_postgres::{
    tls::MakeTlsConnect,
    Client, Config, Socket,
};
use url::Url;

#[derive(Debug)]
pub struct PostgreSQL {
    /// The PostgreSQL client.
    client: Client,
}

impl PostgreSQL {
    /// Wraps an already connected client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects to a PostgreSQL database using a connection URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(Error::driver)?;

        if !matches!(url.scheme(), "postgresql" | "postgres") {
            bail!("connection URL does not have a `postgresql` scheme; url={url}");
        }

        let Some(host) = url.host_str() else {
            bail!("missing host in connection URL; url={url}");
        };

        if url.path().is_empty() || url.path() == "/" {
            bail!("no database specified - missing path in connection URL; url={url}");
        }

        let mut config = Config::new();
        config.host(host);
        config.dbname(url.path().trim_start_matches('/'));

        if let Some(port) = url.port() {
            config.port(port);
        }

        if !url.username().is_empty() {
            config.user(url.username());
        }

        if let Some(password) = url.password() {
            config.password(password);
        }

        for (key, value) in url.query_pairs() {
            if key == "options" {
                config.options(&*value);
            }
        }

        Self::connect_with_config(config, tokio_postgres::NoTls).await
    }

    /// Connects using a [`tokio_postgres::Config`].
    ///
    /// The connection task is spawned on the current tokio runtime.
    pub async fn connect_with_config<T>(config: Config, tls: T) -> Result<Self>
    where
        T: MakeTlsConnect<Socket> + 'static,
        T::Stream: Send,
    {
        let (client, connection) = config.connect(tls).await.map_err(Error::driver)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgresql connection error");
            }
        });

        Ok(Self::new(client))
    }

    async fn transaction(&mut self, op: Transaction) -> Result<Response> {
        let sql = Serializer::new(Flavor::Postgresql).serialize_transaction(&op);
        self.client.batch_execute(&sql).await.map_err(Error::driver)?;
        Ok(Response::count(0))
    }

    async fn query_sql(&mut self, op: QuerySql) -> Result<Response> {
        tracing::trace!(sql = %op.sql, params = op.params.len(), "postgresql exec");

        let params = op.params.into_iter().map(Value::from).collect::<Vec<_>>();
        let args = params
            .iter()
            .map(|param| param as &(dyn ToSql + Sync))
            .collect::<Vec<_>>();

        let Some(ret_tys) = op.ret else {
            let count = self
                .client
                .execute(&op.sql, &args)
                .await
                .map_err(|e| Error::driver(e).context(format!("sql={}", op.sql)))?;
            return Ok(Response::count(count));
        };

        let rows = self
            .client
            .query(&op.sql, &args)
            .await
            .map_err(|e| Error::driver(e).context(format!("sql={}", op.sql)))?;

        let mut ret = Vec::with_capacity(rows.len());

        for row in &rows {
            let mut items = Vec::with_capacity(ret_tys.len());
            for (index, ty) in ret_tys.iter().enumerate() {
                items.push(value::from_row(row, index, *ty)?);
            }
            ret.push(items);
        }

        Ok(Response::values(ret))
    }
}

impl From<Client> for PostgreSQL {
    fn from(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Connection for PostgreSQL {
    fn capability(&self) -> &'static Capability {
        &Capability::POSTGRESQL
    }

    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::QuerySql(op) => self.query_sql(op).await,
            Operation::Transaction(op) => self.transaction(op).await,
        }
    }
}
