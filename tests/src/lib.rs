#[macro_use]
mod macros;

pub mod db;
mod db_test;
mod isolation;

pub use db_test::{Db, DbTest};

use tabula::{Connection, Result};
use tabula_core::driver::Capability;

#[async_trait::async_trait]
pub trait Setup: Send + Sync + 'static {
    /// Opens a connection to an empty database owned by this setup.
    async fn connect(&self) -> Result<Box<dyn Connection>>;

    fn capability(&self) -> &'static Capability;

    /// Drops whatever this setup created. Runs once the test is done.
    async fn cleanup(&self) -> Result<()> {
        Ok(())
    }
}

/// The change emitted for one cell, if any.
pub fn change<'a>(
    changes: &'a [tabula::TableChanges],
    record: &tabula::RecordId,
    field: &tabula::Field,
) -> Option<&'a tabula::change::CellChange> {
    changes
        .iter()
        .filter(|table| table.table_id == field.table)
        .find_map(|table| table.get(record, &field.id))
}
