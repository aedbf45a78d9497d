use tabula::{Connection, Result};
use tabula_core::driver::Capability;

use crate::Setup;

/// Every test gets its own in-memory database.
#[derive(Debug, Default)]
pub struct SetupSqlite;

impl SetupSqlite {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Setup for SetupSqlite {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        tabula::connect("sqlite::memory:").await
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }
}
