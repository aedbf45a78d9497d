//! Field and reference metadata, read fresh for every request.

use crate::{exec, graph::Graph};

use indexmap::IndexMap;
use tabula_core::{
    err,
    schema::{Field, FieldId, FieldKind, Reference, Table, TableId},
    Connection, Error, Result, Type, Value,
};
use tabula_sql::stmt::{self, ColumnDef, Expr, ReferenceClosure, Select, TableRef};
use tabula_sql::Statement;

/// Relation holding one row per table
pub const TABLE_META: &str = "tabula_table";

/// Relation holding one row per field, including deleted ones
pub const FIELD_META: &str = "tabula_field";

/// Relation holding the `(from, to)` dependency edges
pub const REFERENCE_META: &str = "tabula_reference";

const FIELD_COLUMNS: [&str; 9] = [
    "id",
    "table_id",
    "name",
    "kind",
    "cell_type",
    "db_column",
    "is_computed",
    "options",
    "db_generated",
];

/// A snapshot of the metadata store.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: IndexMap<TableId, Table>,
    fields: IndexMap<FieldId, Field>,
    references: Vec<Reference>,
}

impl Catalog {
    /// Creates the metadata relations if they do not exist yet.
    pub async fn install(conn: &mut dyn Connection) -> Result<()> {
        let statements = [
            Statement::create_table_if_not_exists(
                TABLE_META,
                vec![
                    ColumnDef::new("id", Type::Text).primary_key(),
                    ColumnDef::new("name", Type::Text).not_null(),
                    ColumnDef::new("db_table_name", Type::Text).not_null(),
                ],
            ),
            Statement::create_table_if_not_exists(
                FIELD_META,
                vec![
                    ColumnDef::new("id", Type::Text).primary_key(),
                    ColumnDef::new("table_id", Type::Text).not_null(),
                    ColumnDef::new("name", Type::Text).not_null(),
                    ColumnDef::new("kind", Type::Text).not_null(),
                    ColumnDef::new("cell_type", Type::Text).not_null(),
                    ColumnDef::new("db_column", Type::Text).not_null(),
                    ColumnDef::new("is_computed", Type::Boolean).not_null(),
                    ColumnDef::new("options", Type::Text),
                    ColumnDef::new("db_generated", Type::Boolean).not_null(),
                    ColumnDef::new("deleted", Type::Boolean).not_null(),
                ],
            ),
            stmt::CreateTable {
                name: REFERENCE_META.to_string(),
                columns: vec![
                    ColumnDef::new("from_field_id", Type::Text).not_null(),
                    ColumnDef::new("to_field_id", Type::Text).not_null(),
                ],
                primary_key: vec!["from_field_id".to_string(), "to_field_id".to_string()],
                if_not_exists: true,
            }
            .into(),
            Statement::create_index(
                "tabula_reference_to",
                REFERENCE_META,
                vec!["to_field_id".to_string()],
            ),
            Statement::create_index(
                "tabula_field_table",
                FIELD_META,
                vec!["table_id".to_string()],
            ),
        ];

        for stmt in &statements {
            exec::execute(conn, stmt).await?;
        }

        Ok(())
    }

    /// Reads every table, every live field and every reference edge.
    pub async fn load(conn: &mut dyn Connection) -> Result<Catalog> {
        let mut catalog = Catalog::default();

        let select = Select::from(TableRef::new(TABLE_META))
            .column(Expr::column("id"))
            .column(Expr::column("name"))
            .column(Expr::column("db_table_name"))
            .order_by(Expr::column("id"));
        let rows = exec::query(conn, &select.into(), vec![Type::Text; 3]).await?;

        for row in rows {
            let [id, name, db_table_name] = columns(row)?;
            let table = Table {
                id: TableId::new(text(id)?),
                name: text(name)?,
                db_table_name: text(db_table_name)?,
            };
            catalog.tables.insert(table.id.clone(), table);
        }

        let mut select = Select::from(TableRef::new(FIELD_META))
            .filter(Expr::eq(Expr::column("deleted"), Expr::value(false)))
            .order_by(Expr::column("id"));
        for column in FIELD_COLUMNS {
            select = select.column(Expr::column(column));
        }
        let ret = vec![
            Type::Text,
            Type::Text,
            Type::Text,
            Type::Text,
            Type::Text,
            Type::Text,
            Type::Boolean,
            Type::Text,
            Type::Boolean,
        ];

        for row in exec::query(conn, &select.into(), ret).await? {
            let field = decode_field(row)?;
            catalog.fields.insert(field.id.clone(), field);
        }

        let select = Select::from(TableRef::new(REFERENCE_META))
            .column(Expr::column("from_field_id"))
            .column(Expr::column("to_field_id"))
            .order_by(Expr::column("from_field_id"))
            .order_by(Expr::column("to_field_id"));

        for row in exec::query(conn, &select.into(), vec![Type::Text; 2]).await? {
            let [from, to] = columns(row)?;
            catalog.references.push(Reference::new(text(from)?, text(to)?));
        }

        tracing::trace!(
            tables = catalog.tables.len(),
            fields = catalog.fields.len(),
            references = catalog.references.len(),
            "loaded catalog"
        );

        Ok(catalog)
    }

    pub fn table(&self, id: &TableId) -> Result<&Table> {
        self.tables
            .get(id)
            .ok_or_else(|| err!("unknown table; id={id}"))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Returns the live field with the given id.
    pub fn field(&self, id: &FieldId) -> Result<&Field> {
        self.fields
            .get(id)
            .ok_or_else(|| Error::unknown_field(id.as_str()))
    }

    pub fn get_field(&self, id: &FieldId) -> Option<&Field> {
        self.fields.get(id)
    }

    pub fn fields(&self) -> &IndexMap<FieldId, Field> {
        &self.fields
    }

    /// Live fields of one table, in id order.
    pub fn table_fields<'a>(&'a self, table: &'a TableId) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.values().filter(move |field| field.table == *table)
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Builds the in-memory dependency graph over the loaded edges.
    pub fn graph(&self) -> Graph {
        Graph::new(&self.references)
    }

    pub(crate) fn put_field(&mut self, field: Field) {
        self.fields.insert(field.id.clone(), field);
    }

    pub(crate) fn remove_field(&mut self, id: &FieldId) {
        self.fields.shift_remove(id);
        self.references
            .retain(|reference| reference.from != *id && reference.to != *id);
    }

    pub(crate) fn replace_references_to(&mut self, to: &FieldId, references: &[Reference]) {
        self.references.retain(|reference| reference.to != *to);
        self.references.extend(references.iter().cloned());
    }

    pub(crate) async fn insert_table(conn: &mut dyn Connection, table: &Table) -> Result<()> {
        let stmt = Statement::insert(
            TABLE_META,
            vec![
                "id".to_string(),
                "name".to_string(),
                "db_table_name".to_string(),
            ],
            [vec![
                Value::from(table.id.as_str()),
                Value::from(&table.name),
                Value::from(&table.db_table_name),
            ]],
        );
        exec::execute(conn, &stmt).await?;
        Ok(())
    }

    pub(crate) async fn insert_field(conn: &mut dyn Connection, field: &Field) -> Result<()> {
        let mut columns = FIELD_COLUMNS.map(str::to_string).to_vec();
        columns.push("deleted".to_string());

        let row = vec![
            Value::from(field.id.as_str()),
            Value::from(field.table.as_str()),
            Value::from(&field.name),
            Value::from(field.kind.name()),
            Value::from(field.ty.name()),
            Value::from(&field.db_column),
            Value::from(field.is_computed),
            Value::from(field.options.clone()),
            Value::from(field.db_generated),
            Value::from(false),
        ];

        exec::execute(conn, &Statement::insert(FIELD_META, columns, [row])).await?;
        Ok(())
    }

    /// Persists the mutable attributes of a field: storage, type and options.
    pub(crate) async fn update_field(conn: &mut dyn Connection, field: &Field) -> Result<()> {
        let stmt = Statement::update(
            FIELD_META,
            vec![
                ("cell_type".to_string(), Expr::value(field.ty.name())),
                ("db_column".to_string(), Expr::value(&field.db_column)),
                ("options".to_string(), Expr::value(field.options.clone())),
                ("db_generated".to_string(), Expr::value(field.db_generated)),
            ],
            Expr::eq(Expr::column("id"), Expr::value(field.id.as_str())),
        );
        exec::execute(conn, &stmt).await?;
        Ok(())
    }

    pub(crate) async fn mark_deleted(conn: &mut dyn Connection, id: &FieldId) -> Result<()> {
        let stmt = Statement::update(
            FIELD_META,
            vec![("deleted".to_string(), Expr::value(true))],
            Expr::eq(Expr::column("id"), Expr::value(id.as_str())),
        );
        exec::execute(conn, &stmt).await?;
        Ok(())
    }

    pub(crate) async fn insert_references(
        conn: &mut dyn Connection,
        references: &[Reference],
    ) -> Result<()> {
        if references.is_empty() {
            return Ok(());
        }

        let stmt = Statement::insert(
            REFERENCE_META,
            vec!["from_field_id".to_string(), "to_field_id".to_string()],
            references.iter().map(|reference| {
                vec![
                    Value::from(reference.from.as_str()),
                    Value::from(reference.to.as_str()),
                ]
            }),
        );
        exec::execute(conn, &stmt).await?;
        Ok(())
    }

    /// Removes the edges a field depends on.
    pub(crate) async fn delete_references_to(conn: &mut dyn Connection, to: &FieldId) -> Result<()> {
        let stmt = Statement::delete(
            REFERENCE_META,
            Expr::eq(Expr::column("to_field_id"), Expr::value(to.as_str())),
        );
        exec::execute(conn, &stmt).await?;
        Ok(())
    }

    /// Removes every edge touching a field.
    pub(crate) async fn delete_references_of(conn: &mut dyn Connection, id: &FieldId) -> Result<()> {
        for column in ["from_field_id", "to_field_id"] {
            let stmt = Statement::delete(
                REFERENCE_META,
                Expr::eq(Expr::column(column), Expr::value(id.as_str())),
            );
            exec::execute(conn, &stmt).await?;
        }
        Ok(())
    }

    /// Closes over the stored edges leaving `seeds` in one recursive query.
    pub(crate) async fn reference_closure(
        conn: &mut dyn Connection,
        seeds: impl IntoIterator<Item = &FieldId>,
    ) -> Result<Vec<Reference>> {
        let seeds: Vec<Value> = seeds.into_iter().map(|id| Value::from(id.as_str())).collect();
        if seeds.is_empty() {
            return Ok(vec![]);
        }

        let stmt = ReferenceClosure {
            table: REFERENCE_META.to_string(),
            from_column: "from_field_id".to_string(),
            to_column: "to_field_id".to_string(),
            seeds,
        };

        exec::query(conn, &stmt.into(), vec![Type::Text; 2])
            .await?
            .into_iter()
            .map(|row| {
                let [from, to] = columns(row)?;
                Ok(Reference::new(text(from)?, text(to)?))
            })
            .collect()
    }
}

fn decode_field(row: Vec<Value>) -> Result<Field> {
    let [id, table, name, kind, ty, db_column, is_computed, options, db_generated] = columns(row)?;

    let id = FieldId::new(text(id)?);
    let kind = text(kind)?;
    let kind = FieldKind::parse(&kind).ok_or_else(|| err!("unknown field kind; field={id}; kind={kind}"))?;
    let ty = text(ty)?;
    let ty = Type::parse(&ty).ok_or_else(|| err!("unknown cell type; field={id}; type={ty}"))?;

    Ok(Field {
        table: TableId::new(text(table)?),
        name: text(name)?,
        kind,
        ty,
        db_column: text(db_column)?,
        is_computed: flag(is_computed)?,
        db_generated: flag(db_generated)?,
        options: match options {
            Value::Null => None,
            value => Some(text(value)?),
        },
        id,
    })
}

pub(crate) fn columns<const N: usize>(row: Vec<Value>) -> Result<[Value; N]> {
    let len = row.len();
    row.try_into()
        .map_err(|_| err!("unexpected row width; expected={N}; actual={len}"))
}

pub(crate) fn text(value: Value) -> Result<String> {
    match value {
        Value::String(value) => Ok(value),
        value => Err(Error::type_conversion(value, "text")),
    }
}

fn flag(value: Value) -> Result<bool> {
    match value {
        Value::Bool(value) => Ok(value),
        value => Err(Error::type_conversion(value, "boolean")),
    }
}
