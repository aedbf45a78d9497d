//! Recomputes impacted fields with update-from-select statements and reads
//! back the persisted values.

use crate::{
    catalog::{self, Catalog},
    config::Config,
    exec,
    graph::Graph,
    impact::ImpactSet,
    link::Link,
};

use indexmap::{IndexMap, IndexSet};
use tabula_core::{
    formula::parse,
    schema::{Field, FieldId, FieldKind, RecordId, Table, TableId, ID_COLUMN, VERSION_COLUMN},
    Connection, Result, Type, Value,
};
use tabula_sql::{
    stmt::{Expr, Select, TableRef, UpdateFrom},
    CompileContext, Generator,
};

/// Alias of the host table inside a projection
const HOST: &str = "t";

/// Alias of the update target
const TARGET: &str = "u";

/// Alias of the projection inside an update
const SOURCE: &str = "s";

/// Persisted values of one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordValues {
    pub version: i64,
    pub fields: IndexMap<FieldId, Value>,
}

pub type TableValues = IndexMap<RecordId, RecordValues>;

/// Values per table, then per record.
pub type Evaluation = IndexMap<TableId, TableValues>;

#[derive(Debug)]
pub struct Evaluator<'a> {
    catalog: &'a Catalog,
    graph: &'a Graph,
    config: &'a Config,
}

impl<'a> Evaluator<'a> {
    pub fn new(catalog: &'a Catalog, graph: &'a Graph, config: &'a Config) -> Evaluator<'a> {
        Evaluator {
            catalog,
            graph,
            config,
        }
    }

    /// Reads the values currently stored for the impact set, without
    /// recomputing anything.
    pub async fn snapshot(&self, conn: &mut dyn Connection, impact: &ImpactSet) -> Result<Evaluation> {
        let mut ret = Evaluation::new();

        for (table_id, impact) in impact.iter() {
            let table = self.catalog.table(table_id)?;
            let fields = self.fields_of(table_id, &impact.fields);
            let records: Vec<RecordId> = impact.records.iter().cloned().collect();

            let values = ret.entry(table_id.clone()).or_default();
            if fields.is_empty() || records.is_empty() {
                continue;
            }

            self.read(conn, table, &fields, &records, values).await?;
        }

        Ok(ret)
    }

    /// Recomputes the impact set, persists stored columns and returns the
    /// fresh values.
    pub async fn evaluate(&self, conn: &mut dyn Connection, impact: &ImpactSet) -> Result<Evaluation> {
        let mut ret = Evaluation::new();
        let mut valid = IndexSet::new();

        for (table_id, impact) in impact.iter() {
            ret.entry(table_id.clone()).or_default();
            if impact.records.is_empty() {
                continue;
            }
            valid.extend(self.fields_of(table_id, &impact.fields).into_iter().map(|field| field.id.clone()));
        }

        for level in self.graph.topo_levels(&valid)? {
            for (table_id, impact) in impact.iter() {
                let fields: Vec<&Field> = level
                    .iter()
                    .filter_map(|id| self.catalog.get_field(id))
                    .filter(|field| field.table == *table_id && !field.is_generated_formula())
                    .collect();

                if fields.is_empty() {
                    continue;
                }

                let table = self.catalog.table(table_id)?;
                let records: Vec<RecordId> = impact.records.iter().cloned().collect();
                let values = ret.entry(table_id.clone()).or_default();
                self.write(conn, table, &fields, &records, values).await?;
            }
        }

        // Generated columns are maintained by the backend; only read them.
        for (table_id, impact) in impact.iter() {
            let fields: Vec<&Field> = self
                .fields_of(table_id, &impact.fields)
                .into_iter()
                .filter(|field| field.is_generated_formula())
                .collect();

            if fields.is_empty() || impact.records.is_empty() {
                continue;
            }

            let table = self.catalog.table(table_id)?;
            let records: Vec<RecordId> = impact.records.iter().cloned().collect();
            let values = ret.entry(table_id.clone()).or_default();
            self.read(conn, table, &fields, &records, values).await?;
        }

        Ok(ret)
    }

    /// Recomputes `fields` of `table` for `records` in one update-from-select
    /// per page. The fields must not depend on one another.
    pub(crate) async fn write(
        &self,
        conn: &mut dyn Connection,
        table: &Table,
        fields: &[&Field],
        records: &[RecordId],
        values: &mut TableValues,
    ) -> Result<()> {
        let generator = Generator::new(conn.capability().flavor);
        let cx = self.compile_context(&generator, &table.id);

        let mut evaluated = vec![];
        let mut projection = vec![];
        for field in fields {
            match self.derived_sql(&generator, &cx, field) {
                Ok(sql) => {
                    evaluated.push(*field);
                    projection.push(sql);
                }
                Err(err) => {
                    tracing::warn!(field = %field.id, error = %err, "skipping field during evaluation");
                }
            }
        }

        if evaluated.is_empty() {
            return Ok(());
        }
        let fields = &evaluated[..];

        let mut returning = vec![ID_COLUMN.to_string(), VERSION_COLUMN.to_string()];
        returning.extend(fields.iter().map(|field| field.db_column.clone()));

        for chunk in records.chunks(self.config.batch_size()) {
            let mut source = Select::from(TableRef::aliased(&table.db_table_name, HOST))
                .column_as(Expr::qualified(HOST, ID_COLUMN), ID_COLUMN)
                .filter(Expr::in_list(
                    Expr::qualified(HOST, ID_COLUMN),
                    chunk.iter().map(|id| Value::from(id.as_str())),
                ));

            let mut assignments = vec![];
            for (i, (field, sql)) in fields.iter().zip(&projection).enumerate() {
                let alias = format!("v{i}");
                source = source.column_as(Expr::raw(sql), alias.clone());
                assignments.push((field.db_column.clone(), alias));
            }

            let stmt = UpdateFrom {
                table: table.db_table_name.clone(),
                alias: TARGET.to_string(),
                assignments,
                source,
                source_alias: SOURCE.to_string(),
                key: ID_COLUMN.to_string(),
                returning: returning.clone(),
            };

            let rows = exec::query(conn, &stmt.into(), row_types(fields)).await?;
            collect_rows(rows, fields, values)?;
        }

        Ok(())
    }

    /// Reads the stored values of `fields` for `records`.
    async fn read(
        &self,
        conn: &mut dyn Connection,
        table: &Table,
        fields: &[&Field],
        records: &[RecordId],
        values: &mut TableValues,
    ) -> Result<()> {
        for chunk in records.chunks(self.config.batch_size()) {
            let mut select = Select::from(TableRef::new(&table.db_table_name))
                .column(Expr::column(ID_COLUMN))
                .column(Expr::column(VERSION_COLUMN))
                .filter(Expr::in_list(
                    Expr::column(ID_COLUMN),
                    chunk.iter().map(|id| Value::from(id.as_str())),
                ))
                .order_by(Expr::column(ID_COLUMN));

            for field in fields {
                select = select.column(Expr::column(&field.db_column));
            }

            let rows = exec::query(conn, &select.into(), row_types(fields)).await?;
            collect_rows(rows, fields, values)?;
        }

        Ok(())
    }

    /// Live derived fields among `ids` that belong to `table`.
    fn fields_of(&self, table: &TableId, ids: &IndexSet<FieldId>) -> Vec<&'a Field> {
        ids.iter()
            .filter_map(|id| self.catalog.get_field(id))
            .filter(|field| field.table == *table && field.kind.is_derived())
            .collect()
    }

    /// Every field of `table`, readable through the host alias.
    pub(crate) fn compile_context(&self, generator: &Generator, table: &TableId) -> CompileContext {
        let mut cx = CompileContext::qualified(generator, HOST);
        for field in self.catalog.table_fields(table) {
            cx.insert(
                field.id.clone(),
                generator.qualified(HOST, &field.db_column),
                field.ty,
            );
        }
        cx
    }

    /// SQL computing the value of a derived field for the host row.
    fn derived_sql(&self, generator: &Generator, cx: &CompileContext, field: &Field) -> Result<String> {
        Ok(match field.kind {
            FieldKind::Formula => {
                let options = field.formula_options()?;
                let expr = parse(&options.expression)?;
                generator.compile(&expr, cx)?.sql
            }
            FieldKind::Link => {
                let link = Link::resolve(self.catalog, field)?;
                generator.link_cell(&link.source(HOST), &link.title.db_column, link.title.ty)
            }
            FieldKind::Lookup => {
                let link = Link::via(self.catalog, field)?;
                let looked = self.catalog.field(&field.lookup_options()?.lookup_field_id)?;
                generator.lookup_cell(&link.source(HOST), &looked.db_column, looked.ty)
            }
            FieldKind::Rollup => {
                let link = Link::via(self.catalog, field)?;
                let options = field.rollup_options()?;
                let looked = self.catalog.field(&options.lookup_field_id)?;
                generator.rollup_cell(&link.source(HOST), options.function, &looked.db_column)
            }
            FieldKind::Stored => generator.qualified(HOST, &field.db_column),
        })
    }
}

fn row_types(fields: &[&Field]) -> Vec<Type> {
    let mut ret = vec![Type::Text, Type::Integer];
    ret.extend(fields.iter().map(|field| field.ty));
    ret
}

fn collect_rows(rows: Vec<Vec<Value>>, fields: &[&Field], values: &mut TableValues) -> Result<()> {
    for row in rows {
        let mut row = row.into_iter();
        let (Some(id), Some(version)) = (row.next(), row.next()) else {
            continue;
        };

        let record = values.entry(RecordId::new(catalog::text(id)?)).or_default();
        record.version = version.as_i64().unwrap_or_default();

        for (field, value) in fields.iter().zip(row) {
            record.fields.insert(field.id.clone(), value);
        }
    }

    Ok(())
}
