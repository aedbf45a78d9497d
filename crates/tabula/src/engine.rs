use crate::{
    catalog::Catalog,
    change::{ChangeSink, ChangedCell},
    collector::Collector,
    config::Config,
    definitions::Definitions,
    impact::ImpactSet,
    mutation::BaseMutation,
    orchestrator::Orchestrator,
    recompute::{Recompute, RecomputeStats},
};

use indexmap::IndexSet;
use tabula_core::{
    schema::{FieldId, RecordId, TableId},
    Connection, Result,
};

/// Entry point tying the computed-value engine to a configuration.
///
/// The engine keeps no metadata between calls; every operation reads the
/// catalog it needs from the connection.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Engine {
        Engine { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates the metadata tables if missing.
    pub async fn install(&self, conn: &mut dyn Connection) -> Result<()> {
        Catalog::install(conn).await
    }

    pub fn definitions(&self) -> Definitions<'_> {
        Definitions::new(&self.config)
    }

    pub async fn catalog(&self, conn: &mut dyn Connection) -> Result<Catalog> {
        Catalog::load(conn).await
    }

    /// Applies `mutation` and propagates it. See [`Orchestrator::run`].
    pub async fn run(
        &self,
        conn: &mut dyn Connection,
        changes: &[ChangedCell],
        mutation: &mut dyn BaseMutation,
        sink: &mut dyn ChangeSink,
    ) -> Result<usize> {
        Orchestrator::new(&self.config)
            .run(conn, changes, mutation, sink)
            .await
    }

    /// The impact of changing `changes` in `table`, without evaluating it.
    pub async fn collect(
        &self,
        conn: &mut dyn Connection,
        table: &TableId,
        changes: &[(RecordId, FieldId)],
    ) -> Result<ImpactSet> {
        let catalog = Catalog::load(conn).await?;
        let graph = catalog.graph();
        Collector::new(&catalog, &graph, &self.config)
            .collect(conn, table, changes, &IndexSet::new())
            .await
    }

    /// Recomputes `fields` and their dependents over every record. Each page
    /// is written by its own statement; no transaction spans the whole run.
    pub async fn recompute(
        &self,
        conn: &mut dyn Connection,
        fields: impl IntoIterator<Item = FieldId>,
    ) -> Result<RecomputeStats> {
        let seeds: IndexSet<FieldId> = fields.into_iter().collect();
        let catalog = Catalog::load(conn).await?;
        let graph = catalog.graph();
        Recompute::new(&catalog, &graph, &self.config)
            .run(conn, &seeds)
            .await
    }
}
