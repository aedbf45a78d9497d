//! Creating, changing and deleting tables and fields.
//!
//! Every operation runs in its own transaction and either applies fully,
//! back-fill included, or not at all.

use crate::{
    catalog::Catalog,
    config::{Config, GeneratedColumns},
    exec,
    graph::Graph,
    recompute::{Recompute, RecomputeStats},
};

use indexmap::IndexSet;
use std::collections::HashSet;
use tabula_core::{
    driver::operation::Transaction,
    err,
    formula::{parse, Expr},
    schema::{
        Field, FieldId, FieldKind, FormulaOptions, LinkOptions, LookupOptions, Reference,
        Relationship, RollupFunction, RollupOptions, Table, TableId, ID_COLUMN, VERSION_COLUMN,
    },
    Connection, Error, Result, Type,
};
use tabula_sql::{
    formula::ExpandContext,
    stmt::{ColumnDef, Expr as SqlExpr},
    CompileContext, Generator, Statement,
};

/// Key columns of a junction table
const SELF_KEY: &str = "self_key";
const FOREIGN_KEY: &str = "foreign_key";

/// Describes a field to create.
#[derive(Debug, Clone)]
pub struct FieldDef {
    table: TableId,
    name: String,
    kind: FieldDefKind,
    id: Option<FieldId>,
    db_generated: bool,
    require_generated: bool,
}

#[derive(Debug, Clone)]
enum FieldDefKind {
    Stored(Type),
    Formula(String),
    Link {
        foreign_table: TableId,
        title: FieldId,
        relationship: Relationship,

        /// Title of the mirrored field, on the host table. No mirrored field
        /// is created without one.
        symmetric_title: Option<FieldId>,
    },
    Lookup {
        link: FieldId,
        field: FieldId,
    },
    Rollup {
        link: FieldId,
        field: FieldId,
        function: RollupFunction,
    },
}

impl FieldDef {
    fn new(table: &TableId, name: impl Into<String>, kind: FieldDefKind) -> FieldDef {
        FieldDef {
            table: table.clone(),
            name: name.into(),
            kind,
            id: None,
            db_generated: false,
            require_generated: false,
        }
    }

    /// A user-editable field.
    pub fn stored(table: &TableId, name: impl Into<String>, ty: Type) -> FieldDef {
        FieldDef::new(table, name, FieldDefKind::Stored(ty))
    }

    pub fn formula(table: &TableId, name: impl Into<String>, expression: impl Into<String>) -> FieldDef {
        FieldDef::new(table, name, FieldDefKind::Formula(expression.into()))
    }

    /// A link to records of `foreign_table`, titled by `title`.
    pub fn link(
        table: &TableId,
        name: impl Into<String>,
        foreign_table: &TableId,
        title: &FieldId,
        relationship: Relationship,
    ) -> FieldDef {
        FieldDef::new(
            table,
            name,
            FieldDefKind::Link {
                foreign_table: foreign_table.clone(),
                title: title.clone(),
                relationship,
                symmetric_title: None,
            },
        )
    }

    pub fn lookup(table: &TableId, name: impl Into<String>, link: &FieldId, field: &FieldId) -> FieldDef {
        FieldDef::new(
            table,
            name,
            FieldDefKind::Lookup {
                link: link.clone(),
                field: field.clone(),
            },
        )
    }

    pub fn rollup(
        table: &TableId,
        name: impl Into<String>,
        link: &FieldId,
        field: &FieldId,
        function: RollupFunction,
    ) -> FieldDef {
        FieldDef::new(
            table,
            name,
            FieldDefKind::Rollup {
                link: link.clone(),
                field: field.clone(),
                function,
            },
        )
    }

    /// Use a fixed id instead of a generated one.
    pub fn id(mut self, id: impl Into<FieldId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Ask for a backend-generated column. Only formulas honor it.
    pub fn db_generated(mut self) -> Self {
        self.db_generated = true;
        self
    }

    /// Fail instead of falling back to a plain column when the formula
    /// cannot be generated.
    pub fn require_generated(mut self) -> Self {
        self.db_generated = true;
        self.require_generated = true;
        self
    }

    /// Mirror a link on the foreign table, titled by `title` of this table.
    pub fn symmetric(mut self, title: &FieldId) -> Self {
        if let FieldDefKind::Link { symmetric_title, .. } = &mut self.kind {
            *symmetric_title = Some(title.clone());
        }
        self
    }
}

#[derive(Debug)]
pub struct Definitions<'a> {
    config: &'a Config,
}

impl<'a> Definitions<'a> {
    pub fn new(config: &'a Config) -> Definitions<'a> {
        Definitions { config }
    }

    /// Creates a record table.
    pub async fn create_table(&self, conn: &mut dyn Connection, name: &str) -> Result<Table> {
        exec::transaction(conn, Transaction::Start).await?;
        let ret = self.create_table_in_transaction(conn, name).await;
        exec::finish(conn, ret).await
    }

    async fn create_table_in_transaction(&self, conn: &mut dyn Connection, name: &str) -> Result<Table> {
        let id = crate::id::table_id();
        let table = Table {
            db_table_name: id.as_str().to_string(),
            id,
            name: name.to_string(),
        };

        let stmt = Statement::create_table(
            &table.db_table_name,
            vec![
                ColumnDef::new(ID_COLUMN, Type::Text).primary_key().not_null(),
                ColumnDef::new(VERSION_COLUMN, Type::Integer)
                    .not_null()
                    .default(SqlExpr::raw("1")),
            ],
        );
        exec::execute(conn, &stmt).await?;
        Catalog::insert_table(conn, &table).await?;

        tracing::info!(table = %table.id, name = %table.name, "created table");
        Ok(table)
    }

    /// Creates a field and back-fills its values. For a link with a mirrored
    /// side, the mirrored field is created too.
    pub async fn create_field(&self, conn: &mut dyn Connection, def: FieldDef) -> Result<Field> {
        exec::transaction(conn, Transaction::Start).await?;
        let ret = self.create_field_in_transaction(conn, def).await;
        exec::finish(conn, ret).await
    }

    async fn create_field_in_transaction(&self, conn: &mut dyn Connection, def: FieldDef) -> Result<Field> {
        let mut catalog = Catalog::load(conn).await?;
        let table = catalog.table(&def.table)?.clone();
        let id = def.id.clone().unwrap_or_else(crate::id::field_id);

        if catalog.get_field(&id).is_some() {
            return Err(err!("field already exists; field={id}"));
        }

        let mut field = Field {
            db_column: id.as_str().to_string(),
            id: id.clone(),
            table: table.id.clone(),
            name: def.name.clone(),
            kind: FieldKind::Stored,
            ty: Type::Text,
            is_computed: false,
            db_generated: false,
            options: None,
        };

        let mut created = vec![];

        match &def.kind {
            FieldDefKind::Stored(ty) => {
                field.ty = *ty;
                let column = ColumnDef::new(&field.db_column, field.ty);
                self.insert(conn, &mut catalog, &table, &field, column, vec![])
                    .await?;
            }
            FieldDefKind::Formula(expression) => {
                field.kind = FieldKind::Formula;
                field.is_computed = true;
                field.options = Some(encode(&FormulaOptions {
                    expression: expression.clone(),
                    db_generated: def.db_generated,
                    require_generated: def.require_generated,
                })?);

                let expr = parse(expression).map_err(|err| err.context(format!("field {id}")))?;
                let dependencies = check_dependencies(&catalog, &catalog.graph(), &field, &expr)?;
                let column = self.formula_column(conn, &catalog, &mut field, &expr, def.require_generated)?;
                let references = references(&dependencies, &id);
                self.insert(conn, &mut catalog, &table, &field, column, references)
                    .await?;
                created.push(id.clone());
            }
            FieldDefKind::Lookup { link, field: looked } => {
                let (link, looked) = via(&catalog, &table, link, looked)?;
                field.kind = FieldKind::Lookup;
                field.is_computed = true;
                field.ty = Type::Json;
                field.options = Some(encode(&LookupOptions {
                    link_field_id: link.id.clone(),
                    foreign_table_id: looked.table.clone(),
                    lookup_field_id: looked.id.clone(),
                })?);

                let references = vec![
                    Reference::new(link.id.clone(), id.clone()),
                    Reference::new(looked.id.clone(), id.clone()),
                ];
                let column = ColumnDef::new(&field.db_column, field.ty);
                self.insert(conn, &mut catalog, &table, &field, column, references)
                    .await?;
                created.push(id.clone());
            }
            FieldDefKind::Rollup {
                link,
                field: looked,
                function,
            } => {
                let (link, looked) = via(&catalog, &table, link, looked)?;
                field.kind = FieldKind::Rollup;
                field.is_computed = true;
                field.ty = rollup_type(*function, looked.ty);
                field.options = Some(encode(&RollupOptions {
                    link_field_id: link.id.clone(),
                    foreign_table_id: looked.table.clone(),
                    lookup_field_id: looked.id.clone(),
                    function: *function,
                })?);

                let references = vec![
                    Reference::new(link.id.clone(), id.clone()),
                    Reference::new(looked.id.clone(), id.clone()),
                ];
                let column = ColumnDef::new(&field.db_column, field.ty);
                self.insert(conn, &mut catalog, &table, &field, column, references)
                    .await?;
                created.push(id.clone());
            }
            FieldDefKind::Link {
                foreign_table,
                title,
                relationship,
                symmetric_title,
            } => {
                let foreign = catalog.table(foreign_table)?.clone();
                let title = catalog.field(title)?.clone();
                if title.table != foreign.id {
                    return Err(err!(
                        "link title field does not belong to the foreign table; field={id}; title={}",
                        title.id
                    ));
                }

                let symmetric = match symmetric_title {
                    Some(symmetric_title) => {
                        let symmetric_title = catalog.field(symmetric_title)?.clone();
                        if symmetric_title.table != table.id {
                            return Err(err!(
                                "mirrored link title field does not belong to the table; field={id}; title={}",
                                symmetric_title.id
                            ));
                        }
                        Some((crate::id::field_id(), symmetric_title))
                    }
                    None => None,
                };

                let (fk_host_table_name, self_key_name, foreign_key_name) = self
                    .link_storage(conn, &table, &foreign, &id, *relationship)
                    .await?;

                field.kind = FieldKind::Link;
                field.ty = Type::Json;
                field.options = Some(encode(&LinkOptions {
                    relationship: *relationship,
                    foreign_table_id: foreign.id.clone(),
                    lookup_field_id: title.id.clone(),
                    fk_host_table_name: fk_host_table_name.clone(),
                    self_key_name: self_key_name.clone(),
                    foreign_key_name: foreign_key_name.clone(),
                    symmetric_field_id: symmetric.as_ref().map(|(id, _)| id.clone()),
                })?);

                let column = ColumnDef::new(&field.db_column, field.ty);
                let references = vec![Reference::new(title.id.clone(), id.clone())];
                self.insert(conn, &mut catalog, &table, &field, column, references)
                    .await?;
                created.push(id.clone());

                if let Some((symmetric_id, symmetric_title)) = symmetric {
                    let mirrored = Field {
                        db_column: symmetric_id.as_str().to_string(),
                        id: symmetric_id.clone(),
                        table: foreign.id.clone(),
                        name: table.name.clone(),
                        kind: FieldKind::Link,
                        ty: Type::Json,
                        is_computed: false,
                        db_generated: false,
                        options: Some(encode(&LinkOptions {
                            relationship: relationship.symmetric(),
                            foreign_table_id: table.id.clone(),
                            lookup_field_id: symmetric_title.id.clone(),
                            fk_host_table_name,
                            self_key_name: foreign_key_name,
                            foreign_key_name: self_key_name,
                            symmetric_field_id: Some(id.clone()),
                        })?),
                    };

                    let column = ColumnDef::new(&mirrored.db_column, mirrored.ty);
                    let references = vec![Reference::new(symmetric_title.id.clone(), symmetric_id.clone())];
                    self.insert(conn, &mut catalog, &foreign, &mirrored, column, references)
                        .await?;
                    created.push(symmetric_id);
                }
            }
        }

        let stats = self.backfill(conn, &catalog, created).await?;

        tracing::info!(
            field = %field.id,
            kind = field.kind.name(),
            db_generated = field.db_generated,
            records = stats.records,
            "created field"
        );

        Ok(field)
    }

    /// Replaces the expression of a formula field and back-fills it.
    pub async fn update_formula(
        &self,
        conn: &mut dyn Connection,
        field: &FieldId,
        expression: &str,
    ) -> Result<Field> {
        exec::transaction(conn, Transaction::Start).await?;
        let ret = self.update_formula_in_transaction(conn, field, expression).await;
        exec::finish(conn, ret).await
    }

    async fn update_formula_in_transaction(
        &self,
        conn: &mut dyn Connection,
        id: &FieldId,
        expression: &str,
    ) -> Result<Field> {
        let mut catalog = Catalog::load(conn).await?;
        let mut field = catalog.field(id)?.clone();
        if !field.is_formula() {
            return Err(err!("field is not a formula; field={id}"));
        }

        let mut options = field.formula_options()?;
        options.expression = expression.to_string();
        field.options = Some(encode(&options)?);

        let expr = parse(expression).map_err(|err| err.context(format!("field {id}")))?;

        // Check cycles against the graph without the edges being replaced.
        let kept: Vec<Reference> = catalog
            .references()
            .iter()
            .filter(|reference| reference.to != *id)
            .cloned()
            .collect();
        let dependencies = check_dependencies(&catalog, &Graph::new(&kept), &field, &expr)?;

        // Generated columns reading this one, directly or through expansion,
        // are rebuilt around the new column.
        let graph = catalog.graph();
        let generated: IndexSet<FieldId> = graph
            .dependents([id])
            .into_iter()
            .filter(|dependent| {
                catalog
                    .get_field(dependent)
                    .is_some_and(Field::is_generated_formula)
            })
            .collect();
        let generated = graph.topo_sort(&generated)?;

        let table = catalog.table(&field.table)?.clone();
        for dependent in generated.iter().rev() {
            let dependent = catalog.field(dependent)?;
            drop_column(conn, &catalog.table(&dependent.table)?.db_table_name, &dependent.db_column).await?;
        }
        drop_column(conn, &table.db_table_name, &field.db_column).await?;

        let references = references(&dependencies, id);
        Catalog::delete_references_to(conn, id).await?;
        Catalog::insert_references(conn, &references).await?;
        catalog.replace_references_to(id, &references);
        catalog.put_field(field.clone());

        let column = self.formula_column(conn, &catalog, &mut field, &expr, options.require_generated)?;
        self.add_column(conn, &table, column).await?;
        Catalog::update_field(conn, &field).await?;
        catalog.put_field(field.clone());

        for dependent in &generated {
            let mut dependent = catalog.field(dependent)?.clone();
            let dependent_options = dependent.formula_options()?;
            let dependent_expr = parse(&dependent_options.expression)?;
            let column = self.formula_column(
                conn,
                &catalog,
                &mut dependent,
                &dependent_expr,
                dependent_options.require_generated,
            )?;
            let dependent_table = catalog.table(&dependent.table)?.clone();
            self.add_column(conn, &dependent_table, column).await?;
            Catalog::update_field(conn, &dependent).await?;
            catalog.put_field(dependent);
        }

        let mut seeds = vec![id.clone()];
        seeds.extend(generated);
        let stats = self.backfill(conn, &catalog, seeds).await?;

        tracing::info!(
            field = %id,
            db_generated = field.db_generated,
            records = stats.records,
            "updated formula"
        );

        Ok(field)
    }

    /// Deletes a field with every field depending on it, deepest first.
    /// Deleting a link also deletes its mirrored field. Returns the ids of
    /// the deleted fields in deletion order.
    pub async fn delete_field(&self, conn: &mut dyn Connection, field: &FieldId) -> Result<Vec<FieldId>> {
        exec::transaction(conn, Transaction::Start).await?;
        let ret = self.delete_field_in_transaction(conn, field).await;
        exec::finish(conn, ret).await
    }

    async fn delete_field_in_transaction(&self, conn: &mut dyn Connection, id: &FieldId) -> Result<Vec<FieldId>> {
        let mut catalog = Catalog::load(conn).await?;
        let graph = catalog.graph();

        let mut roots: IndexSet<FieldId> = IndexSet::from([catalog.field(id)?.id.clone()]);
        loop {
            let mut doomed = roots.clone();
            doomed.extend(graph.dependents(&roots));

            // Mirrored links go together.
            let mirrored: Vec<FieldId> = doomed
                .iter()
                .filter_map(|id| catalog.get_field(id))
                .filter(|field| field.is_link())
                .filter_map(|field| field.link_options().ok()?.symmetric_field_id)
                .filter(|id| !doomed.contains(id) && catalog.get_field(id).is_some())
                .collect();

            if mirrored.is_empty() {
                roots = doomed;
                break;
            }
            roots = doomed;
            roots.extend(mirrored);
        }

        let order: Vec<FieldId> = graph.topo_sort(&roots)?.into_iter().rev().collect();
        let mut dropped_storage = HashSet::new();

        for id in &order {
            let field = catalog.field(id)?.clone();
            let table = catalog.table(&field.table)?.clone();

            drop_column(conn, &table.db_table_name, &field.db_column).await?;

            if field.is_link() {
                let options = field.link_options()?;
                let storage = link_storage_column(&options);
                if dropped_storage.insert(storage.clone()) {
                    match storage {
                        (table, None) => {
                            exec::execute(conn, &Statement::drop_table_if_exists(table)).await?;
                        }
                        (table, Some(column)) => drop_column(conn, &table, &column).await?,
                    }
                }
            }

            Catalog::delete_references_of(conn, id).await?;
            Catalog::mark_deleted(conn, id).await?;
            catalog.remove_field(id);
        }

        tracing::info!(field = %id, deleted = order.len(), "deleted field");
        Ok(order)
    }

    /// Persists a new field: column, metadata and edges.
    async fn insert(
        &self,
        conn: &mut dyn Connection,
        catalog: &mut Catalog,
        table: &Table,
        field: &Field,
        column: ColumnDef,
        references: Vec<Reference>,
    ) -> Result<()> {
        self.add_column(conn, table, column).await?;
        Catalog::insert_field(conn, field).await?;
        Catalog::insert_references(conn, &references).await?;

        catalog.put_field(field.clone());
        catalog.replace_references_to(&field.id, &references);
        Ok(())
    }

    async fn add_column(&self, conn: &mut dyn Connection, table: &Table, column: ColumnDef) -> Result<()> {
        exec::execute(conn, &Statement::add_column(&table.db_table_name, column)).await?;
        Ok(())
    }

    /// Chooses the storage of a formula field and returns its column. Sets
    /// the field's type and whether the column is generated.
    fn formula_column(
        &self,
        conn: &dyn Connection,
        catalog: &Catalog,
        field: &mut Field,
        expr: &Expr,
        require_generated: bool,
    ) -> Result<ColumnDef> {
        let capability = conn.capability();
        let requested = field.formula_options()?.db_generated
            && self.config.generated_columns == GeneratedColumns::Honor;

        if requested {
            match self.generated_sql(conn, catalog, field, expr) {
                Ok((sql, ty)) => {
                    field.ty = ty;
                    field.db_generated = true;
                    return Ok(ColumnDef::new(&field.db_column, ty)
                        .generated(sql, capability.add_stored_generated));
                }
                Err(err) if err.is_unsupported_function() && !require_generated => {
                    tracing::warn!(
                        field = %field.id,
                        error = %err,
                        "falling back to a plain column"
                    );
                }
                Err(err) => return Err(err.context(format!("field {}", field.id))),
            }
        }

        // Compiled once to validate the expression and infer its type; the
        // evaluator compiles it again for every update.
        let generator = Generator::new(capability.flavor);
        let mut cx = CompileContext::qualified(&generator, "t");
        for other in catalog.table_fields(&field.table) {
            cx.insert(other.id.clone(), generator.qualified("t", &other.db_column), other.ty);
        }
        let compiled = generator
            .compile(expr, &cx)
            .map_err(|err| err.context(format!("field {}", field.id)))?;

        field.ty = compiled.ty;
        field.db_generated = false;
        Ok(ColumnDef::new(&field.db_column, compiled.ty))
    }

    fn generated_sql(
        &self,
        conn: &dyn Connection,
        catalog: &Catalog,
        field: &Field,
        expr: &Expr,
    ) -> Result<(String, Type)> {
        let capability = conn.capability();
        let generator = Generator::for_generated_column(capability.flavor, self.config.clock());

        let expanded;
        let expr = if capability.generated_refs_generated {
            expr
        } else {
            expanded = ExpandContext::new(catalog.fields()).expand_for(&field.id, expr)?;
            &expanded
        };

        let mut cx = CompileContext::unqualified(&generator);
        for other in catalog.table_fields(&field.table) {
            cx.insert(other.id.clone(), generator.ident(&other.db_column), other.ty);
        }

        let compiled = generator.compile(expr, &cx)?;
        Ok((compiled.sql, compiled.ty))
    }

    /// Creates the storage holding a link's pairs. Returns the table holding
    /// them, the column matching host ids and the column holding foreign ids.
    async fn link_storage(
        &self,
        conn: &mut dyn Connection,
        host: &Table,
        foreign: &Table,
        id: &FieldId,
        relationship: Relationship,
    ) -> Result<(String, String, String)> {
        let fk_column = format!("__fk_{id}");

        Ok(match relationship {
            Relationship::ManyMany => {
                let junction = format!("junction_{id}");
                let stmt = Statement::create_table(
                    &junction,
                    vec![
                        ColumnDef::new(ID_COLUMN, Type::Text).primary_key().not_null(),
                        ColumnDef::new(SELF_KEY, Type::Text).not_null(),
                        ColumnDef::new(FOREIGN_KEY, Type::Text).not_null(),
                    ],
                );
                exec::execute(conn, &stmt).await?;

                for key in [SELF_KEY, FOREIGN_KEY] {
                    let index = Statement::create_index(
                        format!("{junction}_{key}"),
                        &junction,
                        vec![key.to_string()],
                    );
                    exec::execute(conn, &index).await?;
                }

                (junction, SELF_KEY.to_string(), FOREIGN_KEY.to_string())
            }
            Relationship::ManyOne | Relationship::OneOne => {
                let column = ColumnDef::new(&fk_column, Type::Text);
                self.add_column(conn, host, column).await?;
                (host.db_table_name.clone(), ID_COLUMN.to_string(), fk_column)
            }
            Relationship::OneMany => {
                let column = ColumnDef::new(&fk_column, Type::Text);
                self.add_column(conn, foreign, column).await?;
                (foreign.db_table_name.clone(), fk_column, ID_COLUMN.to_string())
            }
        })
    }

    async fn backfill(
        &self,
        conn: &mut dyn Connection,
        catalog: &Catalog,
        seeds: Vec<FieldId>,
    ) -> Result<RecomputeStats> {
        if seeds.is_empty() {
            return Ok(RecomputeStats::default());
        }

        let graph = catalog.graph();
        let seeds: IndexSet<FieldId> = seeds.into_iter().collect();
        Recompute::new(catalog, &graph, self.config).run(conn, &seeds).await
    }
}

/// Validates a formula's references: they must exist on the field's table
/// and must not close a cycle in `graph`.
fn check_dependencies(
    catalog: &Catalog,
    graph: &Graph,
    field: &Field,
    expr: &Expr,
) -> Result<IndexSet<FieldId>> {
    let dependencies = expr.field_refs();

    graph.check_new_edges(&field.id, &dependencies)?;

    for dependency in &dependencies {
        let known = catalog
            .get_field(dependency)
            .is_some_and(|other| other.table == field.table);
        if !known {
            return Err(Error::unknown_field(dependency.as_str())
                .context(format!("field {}", field.id)));
        }
    }

    Ok(dependencies)
}

/// Resolves the link and the looked-up field of a lookup or rollup.
fn via<'c>(
    catalog: &'c Catalog,
    table: &Table,
    link: &FieldId,
    looked: &FieldId,
) -> Result<(&'c Field, &'c Field)> {
    let link = catalog.field(link)?;
    if !link.is_link() || link.table != table.id {
        return Err(err!("field is not a link of the table; field={}; table={}", link.id, table.id));
    }

    let options = link.link_options()?;
    let looked = catalog.field(looked)?;
    if looked.table != options.foreign_table_id {
        return Err(err!(
            "looked up field does not belong to the linked table; field={}; link={}",
            looked.id,
            link.id
        ));
    }

    Ok((link, looked))
}

fn references(dependencies: &IndexSet<FieldId>, to: &FieldId) -> Vec<Reference> {
    dependencies
        .iter()
        .map(|from| Reference::new(from.clone(), to.clone()))
        .collect()
}

fn rollup_type(function: RollupFunction, looked: Type) -> Type {
    match function {
        RollupFunction::Sum
        | RollupFunction::Average
        | RollupFunction::Count
        | RollupFunction::Counta => Type::Number,
        RollupFunction::Max | RollupFunction::Min => looked,
        RollupFunction::Concatenate => Type::Text,
    }
}

/// The table, and the key column unless it is a junction table, holding a
/// link's pairs. Both sides of a mirrored link resolve to the same value.
fn link_storage_column(options: &LinkOptions) -> (String, Option<String>) {
    if options.self_key_name != ID_COLUMN && options.foreign_key_name != ID_COLUMN {
        (options.fk_host_table_name.clone(), None)
    } else if options.self_key_name == ID_COLUMN {
        (options.fk_host_table_name.clone(), Some(options.foreign_key_name.clone()))
    } else {
        (options.fk_host_table_name.clone(), Some(options.self_key_name.clone()))
    }
}

async fn drop_column(conn: &mut dyn Connection, table: &str, column: &str) -> Result<()> {
    exec::execute(conn, &Statement::drop_column(table, column)).await?;
    Ok(())
}

fn encode<T: serde::Serialize>(options: &T) -> Result<String> {
    Ok(serde_json::to_string(options)?)
}
