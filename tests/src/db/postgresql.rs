use tabula::{Connection, Result};
use tabula_core::driver::{operation::QuerySql, Capability};

use crate::{isolation::TestIsolation, Setup};

const DEFAULT_URL: &str = "postgresql://localhost:5432/tabula_test";

/// Runs each test in its own schema of the database named by
/// `TABULA_TEST_POSTGRES_URL`.
pub struct SetupPostgreSQL {
    isolation: TestIsolation,
}

impl SetupPostgreSQL {
    pub fn new() -> Self {
        Self {
            isolation: TestIsolation::new(),
        }
    }

    fn url() -> String {
        std::env::var("TABULA_TEST_POSTGRES_URL").unwrap_or_else(|_| DEFAULT_URL.to_string())
    }
}

impl Default for SetupPostgreSQL {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Setup for SetupPostgreSQL {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let schema = self.isolation.schema_name();
        let mut conn = tabula::connect(&Self::url()).await?;

        conn.exec(QuerySql::execute(format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""), vec![]).into())
            .await?;
        conn.exec(QuerySql::execute(format!("SET search_path TO \"{schema}\""), vec![]).into())
            .await?;

        Ok(conn)
    }

    fn capability(&self) -> &'static Capability {
        &Capability::POSTGRESQL
    }

    async fn cleanup(&self) -> Result<()> {
        let schema = self.isolation.schema_name();
        let mut conn = tabula::connect(&Self::url()).await?;

        conn.exec(QuerySql::execute(format!("DROP SCHEMA IF EXISTS \"{schema}\" CASCADE"), vec![]).into())
            .await?;
        Ok(())
    }
}
