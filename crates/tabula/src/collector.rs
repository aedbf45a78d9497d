//! Computes which fields and records a set of changed cells impacts.

use crate::{
    catalog::Catalog,
    config::{Closure, Config},
    graph::Graph,
    impact::ImpactSet,
    link::Link,
};

use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;
use tabula_core::{
    formula::parse,
    schema::{Field, FieldId, FieldKind, RecordId, TableId},
    Connection, Result,
};

#[derive(Debug)]
pub struct Collector<'a> {
    catalog: &'a Catalog,
    graph: &'a Graph,
    config: &'a Config,
}

/// Edge of the table adjacency: records of `host` link to records of the
/// table the edge leaves through `link`.
#[derive(Debug)]
struct Hop<'a> {
    host: &'a TableId,
    link: Link<'a>,
}

impl<'a> Collector<'a> {
    pub fn new(catalog: &'a Catalog, graph: &'a Graph, config: &'a Config) -> Collector<'a> {
        Collector {
            catalog,
            graph,
            config,
        }
    }

    /// Collects the impact of `changes`, `(record, field)` pairs of `source`.
    /// Fields in `exclude` are never reported as impacted.
    pub async fn collect(
        &self,
        conn: &mut dyn Connection,
        source: &TableId,
        changes: &[(RecordId, FieldId)],
        exclude: &IndexSet<FieldId>,
    ) -> Result<ImpactSet> {
        if changes.is_empty() {
            return Ok(ImpactSet::new());
        }

        let changed_records: IndexSet<RecordId> =
            changes.iter().map(|(record, _)| record.clone()).collect();
        let changed_fields: IndexSet<FieldId> =
            changes.iter().map(|(_, field)| field.clone()).collect();

        let fields = self.impacted_fields(conn, &changed_fields, exclude).await?;
        if fields.is_empty() {
            return Ok(ImpactSet::new());
        }

        let adjacency = self.adjacency();
        let relevant = self.relevant_links(&fields);

        let mut records: IndexMap<TableId, IndexSet<RecordId>> = IndexMap::new();
        records.insert(source.clone(), changed_records.clone());

        let mut queue = VecDeque::from([(source.clone(), changed_records)]);

        while let Some((table, frontier)) = queue.pop_front() {
            let frontier: Vec<RecordId> = frontier.into_iter().collect();

            for hop in adjacency.get(&table).into_iter().flatten() {
                if !fields.contains_key(hop.host) || !relevant.contains(&hop.link.field.id) {
                    continue;
                }

                let linked = hop
                    .link
                    .hosts_linked_to(conn, &frontier, self.config.batch_size())
                    .await?;

                let known = records.entry(hop.host.clone()).or_default();
                let discovered: IndexSet<RecordId> = linked
                    .into_iter()
                    .filter(|record| known.insert(record.clone()))
                    .collect();

                tracing::trace!(
                    from = %table,
                    to = %hop.host,
                    link = %hop.link.field.id,
                    discovered = discovered.len(),
                    "propagation hop"
                );

                if !discovered.is_empty() {
                    queue.push_back((hop.host.clone(), discovered));
                }
            }
        }

        let mut impact = ImpactSet::new();
        for (table, fields) in fields {
            let records = records.shift_remove(&table).unwrap_or_default();
            impact.insert(table, fields, records);
        }
        impact.prune();

        Ok(impact)
    }

    /// Step 1: derived fields reachable from the changed fields, grouped by
    /// table. Changed link fields are part of the impact themselves.
    async fn impacted_fields(
        &self,
        conn: &mut dyn Connection,
        changed: &IndexSet<FieldId>,
        exclude: &IndexSet<FieldId>,
    ) -> Result<IndexMap<TableId, IndexSet<FieldId>>> {
        let reachable = match self.config.closure {
            Closure::Iterative => self.graph.dependents(changed),
            Closure::RecursiveQuery => Catalog::reference_closure(conn, changed)
                .await?
                .into_iter()
                .map(|reference| reference.to)
                .collect(),
        };

        let changed_links = changed
            .iter()
            .filter(|id| self.catalog.get_field(id).is_some_and(Field::is_link));

        let mut ret: IndexMap<TableId, IndexSet<FieldId>> = IndexMap::new();

        for id in reachable.iter().chain(changed_links) {
            if exclude.contains(id) {
                continue;
            }

            let Some(field) = self.catalog.get_field(id) else {
                continue;
            };

            if !field.kind.is_derived() {
                continue;
            }

            if let Err(err) = self.check(field) {
                tracing::warn!(field = %field.id, error = %err, "skipping field during propagation");
                continue;
            }

            ret.entry(field.table.clone())
                .or_default()
                .insert(field.id.clone());
        }

        Ok(ret)
    }

    /// Step 2: `U -> V` when table `V` holds a link whose foreign table is `U`.
    fn adjacency(&self) -> IndexMap<&'a TableId, Vec<Hop<'a>>> {
        let mut ret: IndexMap<&'a TableId, Vec<Hop<'a>>> = IndexMap::new();

        for field in self.catalog.fields().values().filter(|field| field.is_link()) {
            match Link::resolve(self.catalog, field) {
                Ok(link) => {
                    let foreign = link.foreign;
                    ret.entry(&foreign.id).or_default().push(Hop {
                        host: &field.table,
                        link,
                    });
                }
                Err(err) => {
                    tracing::warn!(field = %field.id, error = %err, "skipping link during propagation");
                }
            }
        }

        ret
    }

    /// Links whose storage matters to the impacted fields: impacted links and
    /// the links impacted lookups and rollups read through.
    fn relevant_links(&self, fields: &IndexMap<TableId, IndexSet<FieldId>>) -> IndexSet<FieldId> {
        let mut ret = IndexSet::new();

        for id in fields.values().flatten() {
            let Some(field) = self.catalog.get_field(id) else {
                continue;
            };

            match field.kind {
                FieldKind::Link => {
                    ret.insert(field.id.clone());
                }
                FieldKind::Lookup | FieldKind::Rollup => {
                    if let Ok(Some(link)) = field.via_link() {
                        ret.insert(link);
                    }
                }
                _ => {}
            }
        }

        ret
    }

    /// Verifies the field's metadata is usable for propagation.
    fn check(&self, field: &Field) -> Result<()> {
        match field.kind {
            FieldKind::Formula => parse(&field.formula_options()?.expression).map(drop),
            FieldKind::Link => Link::resolve(self.catalog, field).map(drop),
            FieldKind::Lookup | FieldKind::Rollup => Link::via(self.catalog, field).map(drop),
            FieldKind::Stored => Ok(()),
        }
    }
}
