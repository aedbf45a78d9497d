//! Runs one mutation end to end: collect, snapshot, apply, evaluate, diff.

use crate::{
    catalog::Catalog,
    change::{CellChange, ChangeSink, ChangedCell},
    collector::Collector,
    config::Config,
    evaluator::{Evaluation, Evaluator},
    exec,
    graph::Graph,
    impact::ImpactSet,
    mutation::BaseMutation,
};

use indexmap::{IndexMap, IndexSet};
use tabula_core::{
    driver::operation::Transaction,
    schema::{FieldId, RecordId, TableId},
    Connection, Result, Value,
};

#[derive(Debug)]
pub struct Orchestrator<'a> {
    config: &'a Config,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config) -> Orchestrator<'a> {
        Orchestrator { config }
    }

    /// Applies `mutation` and propagates it to every derived field, all in
    /// one transaction. `changes` lists the cells the mutation writes, on top
    /// of the ones the mutation reports itself.
    ///
    /// Derived changes reach `sink` only once the transaction committed.
    /// Returns the number of emitted changes.
    pub async fn run(
        &self,
        conn: &mut dyn Connection,
        changes: &[ChangedCell],
        mutation: &mut dyn BaseMutation,
        sink: &mut dyn ChangeSink,
    ) -> Result<usize> {
        exec::transaction(conn, Transaction::Start).await?;
        let ret = self.run_in_transaction(conn, changes, mutation).await;
        let emitted = exec::finish(conn, ret).await?;

        let mut count = 0;
        for (table, changes) in emitted {
            count += changes.len();
            sink.emit(&table, changes);
        }

        Ok(count)
    }

    async fn run_in_transaction(
        &self,
        conn: &mut dyn Connection,
        changes: &[ChangedCell],
        mutation: &mut dyn BaseMutation,
    ) -> Result<IndexMap<TableId, Vec<CellChange>>> {
        let catalog = Catalog::load(conn).await?;
        let graph = catalog.graph();

        let mut changes = changes.to_vec();
        changes.extend(mutation.changes(conn, &catalog).await?);

        // COLLECT
        let impact = self.collect(conn, &catalog, &graph, &changes).await?;
        let evaluator = Evaluator::new(&catalog, &graph, self.config);

        // SNAPSHOT_OLD
        let old = evaluator.snapshot(conn, &impact).await?;

        // APPLY_BASE_MUTATION
        mutation.apply(conn).await?;

        if impact.is_empty() {
            tracing::debug!(changes = changes.len(), "mutation impacts no derived field");
            return Ok(IndexMap::new());
        }

        // EVALUATE_NEW
        let new = evaluator.evaluate(conn, &impact).await?;

        // DIFF_AND_EMIT
        Ok(diff(&impact, &old, &new))
    }

    /// Merges the impact of every source table. Fields the caller wrote
    /// directly are excluded, except links, whose cells are derived from the
    /// storage the mutation touches.
    async fn collect(
        &self,
        conn: &mut dyn Connection,
        catalog: &Catalog,
        graph: &Graph,
        changes: &[ChangedCell],
    ) -> Result<ImpactSet> {
        let mut by_table: IndexMap<&TableId, Vec<(RecordId, FieldId)>> = IndexMap::new();
        for change in changes {
            by_table
                .entry(&change.table)
                .or_default()
                .push((change.record.clone(), change.field.clone()));
        }

        let exclude: IndexSet<FieldId> = changes
            .iter()
            .filter(|change| !catalog.get_field(&change.field).is_some_and(|field| field.is_link()))
            .map(|change| change.field.clone())
            .collect();

        let collector = Collector::new(catalog, graph, self.config);
        let mut impact = ImpactSet::new();

        for (table, changes) in by_table {
            impact.merge(collector.collect(conn, table, &changes, &exclude).await?);
        }

        impact.exclude(&exclude);
        impact.prune();

        tracing::debug!(
            tables = impact.len(),
            fields = impact.fields().len(),
            "collected impact"
        );

        Ok(impact)
    }
}

/// Changes between `old` and `new`, restricted to the impact set. Equal
/// values are suppressed.
fn diff(impact: &ImpactSet, old: &Evaluation, new: &Evaluation) -> IndexMap<TableId, Vec<CellChange>> {
    let mut ret = IndexMap::new();

    for (table, impact) in impact.iter() {
        let Some(new) = new.get(table) else {
            continue;
        };
        let old = old.get(table);
        let mut changes = vec![];

        for (record, values) in new {
            if !impact.records.contains(record) {
                continue;
            }

            let before = old.and_then(|old| old.get(record));

            for (field, value) in &values.fields {
                if !impact.fields.contains(field) {
                    continue;
                }

                let old_value = before
                    .and_then(|before| before.fields.get(field))
                    .cloned()
                    .unwrap_or(Value::Null);

                if old_value == *value {
                    continue;
                }

                changes.push(CellChange {
                    record_id: record.clone(),
                    field_id: field.clone(),
                    old_value,
                    new_value: value.clone(),
                    version: values.version,
                });
            }
        }

        if !changes.is_empty() {
            ret.insert(table.clone(), changes);
        }
    }

    ret
}
