//! Full-table recomputation in topological order, one page of records at a
//! time.

use crate::{
    catalog::{self, Catalog},
    config::Config,
    evaluator::{Evaluator, TableValues},
    exec,
    graph::Graph,
};

use indexmap::{IndexMap, IndexSet};
use tabula_core::{
    schema::{Field, FieldId, RecordId, Table, TableId, ID_COLUMN},
    Connection, Result, Type,
};
use tabula_sql::stmt::{BinaryOp, Expr, Select, TableRef};

/// What a bulk recompute touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeStats {
    /// Fields written
    pub fields: usize,

    /// Update statements issued
    pub pages: usize,

    /// Record rows written, counted once per statement
    pub records: usize,
}

#[derive(Debug)]
pub struct Recompute<'a> {
    catalog: &'a Catalog,
    graph: &'a Graph,
    config: &'a Config,
}

impl<'a> Recompute<'a> {
    pub fn new(catalog: &'a Catalog, graph: &'a Graph, config: &'a Config) -> Recompute<'a> {
        Recompute {
            catalog,
            graph,
            config,
        }
    }

    /// Recomputes `seeds` and every field depending on them, for all records.
    pub async fn run(
        &self,
        conn: &mut dyn Connection,
        seeds: &IndexSet<FieldId>,
    ) -> Result<RecomputeStats> {
        let mut fields: IndexSet<FieldId> = seeds.clone();
        fields.extend(self.graph.dependents(seeds));
        fields.retain(|id| {
            self.catalog
                .get_field(id)
                .is_some_and(|field| field.kind.is_derived() && !field.is_generated_formula())
        });

        let mut stats = RecomputeStats::default();
        let evaluator = Evaluator::new(self.catalog, self.graph, self.config);

        for (depth, level) in self.graph.topo_levels(&fields)?.into_iter().enumerate() {
            let mut by_table: IndexMap<&TableId, Vec<&Field>> = IndexMap::new();
            for id in &level {
                let field = self.catalog.field(id)?;
                by_table.entry(&field.table).or_default().push(field);
            }

            for (table, fields) in by_table {
                let table = self.catalog.table(table)?;
                self.table(conn, &evaluator, table, &fields, depth, &mut stats)
                    .await?;
                stats.fields += fields.len();
            }
        }

        Ok(stats)
    }

    /// Walks `table` by primary key, rewriting `fields` page by page.
    async fn table(
        &self,
        conn: &mut dyn Connection,
        evaluator: &Evaluator<'_>,
        table: &Table,
        fields: &[&Field],
        depth: usize,
        stats: &mut RecomputeStats,
    ) -> Result<()> {
        let mut after: Option<RecordId> = None;

        loop {
            let records = self.page(conn, table, after.as_ref()).await?;
            let Some(last) = records.last() else {
                break;
            };
            after = Some(last.clone());

            let mut values = TableValues::new();
            evaluator
                .write(conn, table, fields, &records, &mut values)
                .await?;

            stats.pages += 1;
            stats.records += values.len();

            tracing::info!(
                table = %table.id,
                depth,
                fields = fields.len(),
                records = values.len(),
                "recomputed page"
            );

            if records.len() < self.config.batch_size() {
                break;
            }
        }

        Ok(())
    }

    async fn page(
        &self,
        conn: &mut dyn Connection,
        table: &Table,
        after: Option<&RecordId>,
    ) -> Result<Vec<RecordId>> {
        let mut select = Select::from(TableRef::new(&table.db_table_name))
            .column(Expr::column(ID_COLUMN))
            .order_by(Expr::column(ID_COLUMN))
            .limit(self.config.batch_size() as u64);

        if let Some(after) = after {
            select = select.filter(Expr::binary_op(
                Expr::column(ID_COLUMN),
                BinaryOp::Gt,
                Expr::value(after.as_str()),
            ));
        }

        exec::query(conn, &select.into(), vec![Type::Text])
            .await?
            .into_iter()
            .map(|row| {
                let [id] = catalog::columns(row)?;
                Ok(RecordId::new(catalog::text(id)?))
            })
            .collect()
    }
}
