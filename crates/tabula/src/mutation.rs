//! Base mutations: the writes a caller wraps in a propagation run.

use crate::{catalog::Catalog, change::ChangedCell, exec, id, link::Link};

use indexmap::{IndexMap, IndexSet};
use tabula_core::{
    async_trait, bail,
    driver::operation::QuerySql,
    schema::{
        Field, FieldId, FieldKind, LinkOptions, RecordId, Relationship, Table, TableId, ID_COLUMN,
        VERSION_COLUMN,
    },
    Connection, Result, Value,
};
use tabula_sql::{
    serializer::quote_ident,
    stmt::{BinaryOp, Expr},
    Statement,
};

/// The write performed between the old-value snapshot and the evaluation of
/// derived fields.
#[async_trait]
pub trait BaseMutation: Send + Sync {
    /// Performs the write.
    async fn apply(&mut self, conn: &mut dyn Connection) -> Result<()>;

    /// Cells the mutation changes, in addition to the ones the caller lists.
    /// Called before `apply`, inside the same transaction.
    async fn changes(
        &self,
        _conn: &mut dyn Connection,
        _catalog: &Catalog,
    ) -> Result<Vec<ChangedCell>> {
        Ok(vec![])
    }
}

/// Raw parameterised SQL, run in order.
#[derive(Debug, Clone, Default)]
pub struct Statements {
    ops: Vec<QuerySql>,
}

impl Statements {
    pub fn new() -> Statements {
        Statements::default()
    }

    pub fn push(mut self, sql: impl Into<String>, params: Vec<Value>) -> Self {
        self.ops.push(QuerySql::execute(sql, params));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[async_trait]
impl BaseMutation for Statements {
    async fn apply(&mut self, conn: &mut dyn Connection) -> Result<()> {
        for op in &self.ops {
            tracing::debug!(sql = %op.sql, params = op.params.len(), "base mutation");
            conn.exec(op.clone().into()).await?;
        }
        Ok(())
    }
}

/// Writes values into user-editable cells of existing records and bumps
/// their version.
#[derive(Debug, Clone)]
pub struct UpdateCells {
    table: Table,
    records: IndexMap<RecordId, Vec<(Field, Value)>>,
}

impl UpdateCells {
    pub fn new(table: &Table) -> UpdateCells {
        UpdateCells {
            table: table.clone(),
            records: IndexMap::new(),
        }
    }

    pub fn set(mut self, record: impl Into<RecordId>, field: &Field, value: impl Into<Value>) -> Self {
        self.records
            .entry(record.into())
            .or_default()
            .push((field.clone(), value.into()));
        self
    }
}

#[async_trait]
impl BaseMutation for UpdateCells {
    async fn apply(&mut self, conn: &mut dyn Connection) -> Result<()> {
        let flavor = conn.capability().flavor;
        let version = quote_ident(flavor, VERSION_COLUMN);

        for (record, cells) in &self.records {
            let mut assignments = vec![];

            for (field, value) in cells {
                if field.table != self.table.id || field.kind != FieldKind::Stored {
                    bail!(
                        "field is not an editable cell of the table; field={}; table={}",
                        field.id,
                        self.table.id
                    );
                }
                assignments.push((field.db_column.clone(), Expr::value(value.clone())));
            }

            assignments.push((
                VERSION_COLUMN.to_string(),
                Expr::raw(format!("{version} + 1")),
            ));

            let stmt = Statement::update(
                &self.table.db_table_name,
                assignments,
                Expr::eq(Expr::column(ID_COLUMN), Expr::value(record.as_str())),
            );
            exec::execute(conn, &stmt).await?;
        }

        Ok(())
    }

    async fn changes(&self, _conn: &mut dyn Connection, _catalog: &Catalog) -> Result<Vec<ChangedCell>> {
        Ok(self
            .records
            .iter()
            .flat_map(|(record, cells)| {
                cells.iter().map(move |(field, _)| {
                    ChangedCell::new(self.table.id.clone(), record.clone(), field.id.clone())
                })
            })
            .collect())
    }
}

/// Inserts new records with values for user-editable cells.
#[derive(Debug, Clone)]
pub struct InsertRecords {
    table: Table,
    records: Vec<(RecordId, Vec<(Field, Value)>)>,
}

impl InsertRecords {
    pub fn new(table: &Table) -> InsertRecords {
        InsertRecords {
            table: table.clone(),
            records: vec![],
        }
    }

    /// Adds a record with a fresh id, returned for later reference.
    pub fn record(&mut self, cells: Vec<(&Field, Value)>) -> RecordId {
        let record = id::record_id();
        self.record_with_id(record.clone(), cells);
        record
    }

    pub fn record_with_id(&mut self, record: RecordId, cells: Vec<(&Field, Value)>) {
        self.records.push((
            record,
            cells
                .into_iter()
                .map(|(field, value)| (field.clone(), value))
                .collect(),
        ));
    }
}

#[async_trait]
impl BaseMutation for InsertRecords {
    async fn apply(&mut self, conn: &mut dyn Connection) -> Result<()> {
        for (record, cells) in &self.records {
            let mut columns = vec![ID_COLUMN.to_string()];
            let mut row = vec![Value::from(record.as_str())];

            for (field, value) in cells {
                if field.table != self.table.id || field.kind != FieldKind::Stored {
                    bail!(
                        "field is not an editable cell of the table; field={}; table={}",
                        field.id,
                        self.table.id
                    );
                }
                columns.push(field.db_column.clone());
                row.push(value.clone());
            }

            let stmt = Statement::insert(&self.table.db_table_name, columns, [row]);
            exec::execute(conn, &stmt).await?;
        }

        Ok(())
    }

    /// Every editable cell and link of a new record counts as changed, set or
    /// not, so derived fields reading empty cells are computed too.
    async fn changes(&self, _conn: &mut dyn Connection, catalog: &Catalog) -> Result<Vec<ChangedCell>> {
        let fields: Vec<&FieldId> = catalog
            .table_fields(&self.table.id)
            .filter(|field| matches!(field.kind, FieldKind::Stored | FieldKind::Link))
            .map(|field| &field.id)
            .collect();

        Ok(self
            .records
            .iter()
            .flat_map(|(record, _)| {
                fields.iter().map(move |field| {
                    ChangedCell::new(self.table.id.clone(), record.clone(), (*field).clone())
                })
            })
            .collect())
    }
}

/// Replaces the records one host record links to through a link field.
#[derive(Debug, Clone)]
pub struct SetLinks {
    link: Field,
    options: LinkOptions,
    host: RecordId,
    foreign: IndexSet<RecordId>,
}

impl SetLinks {
    pub fn new<R: Into<RecordId>>(
        link: &Field,
        host: impl Into<RecordId>,
        foreign: impl IntoIterator<Item = R>,
    ) -> Result<SetLinks> {
        let options = link.link_options()?;
        let foreign: IndexSet<RecordId> = foreign.into_iter().map(Into::into).collect();

        if options.relationship.is_single() && foreign.len() > 1 {
            bail!(
                "link holds at most one record; field={}; records={}",
                link.id,
                foreign.len()
            );
        }

        Ok(SetLinks {
            link: link.clone(),
            options,
            host: host.into(),
            foreign,
        })
    }

    fn is_junction(&self) -> bool {
        self.options.self_key_name != ID_COLUMN && self.options.foreign_key_name != ID_COLUMN
    }
}

#[async_trait]
impl BaseMutation for SetLinks {
    async fn apply(&mut self, conn: &mut dyn Connection) -> Result<()> {
        let options = &self.options;
        let host = Value::from(self.host.as_str());
        let foreign = self.foreign.iter().map(|id| Value::from(id.as_str()));

        if self.is_junction() {
            let delete = Statement::delete(
                &options.fk_host_table_name,
                Expr::eq(Expr::column(&options.self_key_name), Expr::value(host.clone())),
            );
            exec::execute(conn, &delete).await?;

            if !self.foreign.is_empty() {
                let insert = Statement::insert(
                    &options.fk_host_table_name,
                    vec![
                        ID_COLUMN.to_string(),
                        options.self_key_name.clone(),
                        options.foreign_key_name.clone(),
                    ],
                    foreign.map(|foreign| vec![Value::from(id::junction_row_id()), host.clone(), foreign]),
                );
                exec::execute(conn, &insert).await?;
            }
        } else if options.self_key_name == ID_COLUMN {
            // The key column lives on the host row.
            let target = foreign.into_iter().next().unwrap_or(Value::Null);

            // A one-to-one target leaves the host it was linked from.
            if options.relationship == Relationship::OneOne && !target.is_null() {
                let release = Statement::update(
                    &options.fk_host_table_name,
                    vec![(options.foreign_key_name.clone(), Expr::value(Value::Null))],
                    Expr::and([
                        Expr::eq(Expr::column(&options.foreign_key_name), Expr::value(target.clone())),
                        Expr::binary_op(Expr::column(ID_COLUMN), BinaryOp::Ne, Expr::value(host.clone())),
                    ]),
                );
                exec::execute(conn, &release).await?;
            }

            let update = Statement::update(
                &options.fk_host_table_name,
                vec![(options.foreign_key_name.clone(), Expr::value(target))],
                Expr::eq(Expr::column(ID_COLUMN), Expr::value(host)),
            );
            exec::execute(conn, &update).await?;
        } else {
            // The key column lives on the foreign rows.
            let clear = Statement::update(
                &options.fk_host_table_name,
                vec![(options.self_key_name.clone(), Expr::value(Value::Null))],
                Expr::eq(Expr::column(&options.self_key_name), Expr::value(host.clone())),
            );
            exec::execute(conn, &clear).await?;

            if !self.foreign.is_empty() {
                let set = Statement::update(
                    &options.fk_host_table_name,
                    vec![(options.self_key_name.clone(), Expr::value(host))],
                    Expr::in_list(Expr::column(ID_COLUMN), foreign),
                );
                exec::execute(conn, &set).await?;
            }
        }

        Ok(())
    }

    /// The link cell of the host, and the mirrored cells of every foreign
    /// record linked before or after. When each foreign record links to at
    /// most one host, the hosts the newly linked records leave change too.
    async fn changes(&self, conn: &mut dyn Connection, catalog: &Catalog) -> Result<Vec<ChangedCell>> {
        let link = Link::resolve(catalog, catalog.field(&self.link.id)?)?;
        let mut ret = vec![ChangedCell::new(
            self.link.table.clone(),
            self.host.clone(),
            self.link.id.clone(),
        )];

        if self.options.relationship.symmetric().is_single() {
            let records: Vec<RecordId> = self.foreign.iter().cloned().collect();
            let previous = link.hosts_linked_to(conn, &records, usize::MAX).await?;

            for record in previous {
                if record != self.host {
                    ret.push(ChangedCell::new(
                        self.link.table.clone(),
                        record,
                        self.link.id.clone(),
                    ));
                }
            }
        }

        let Some(symmetric) = &self.options.symmetric_field_id else {
            return Ok(ret);
        };
        let symmetric = catalog.field(symmetric)?;

        let before = link
            .foreign_linked_from(conn, std::slice::from_ref(&self.host), usize::MAX)
            .await?;
        let foreign_table: &TableId = &link.foreign.id;

        for record in before.iter().chain(&self.foreign) {
            ret.push(ChangedCell::new(
                foreign_table.clone(),
                record.clone(),
                symmetric.id.clone(),
            ));
        }

        Ok(ret)
    }
}
