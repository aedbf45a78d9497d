//! Resolution of link fields to the storage holding their pairs.

use crate::{catalog::Catalog, exec};

use indexmap::IndexSet;
use tabula_core::{
    err,
    schema::{Field, LinkOptions, RecordId, Table},
    Connection, Result, Type, Value,
};
use tabula_sql::{
    formula::LinkSource,
    stmt::{Expr, Select, TableRef},
};

/// A link field together with everything needed to read its pairs.
#[derive(Debug, Clone)]
pub(crate) struct Link<'a> {
    pub(crate) field: &'a Field,
    pub(crate) options: LinkOptions,
    pub(crate) foreign: &'a Table,
    pub(crate) title: &'a Field,
}

impl<'a> Link<'a> {
    pub(crate) fn resolve(catalog: &'a Catalog, field: &'a Field) -> Result<Link<'a>> {
        if !field.is_link() {
            return Err(err!("field is not a link; field={}", field.id));
        }

        let options = field.link_options()?;
        let foreign = catalog.table(&options.foreign_table_id)?;
        let title = catalog.field(&options.lookup_field_id)?;

        if title.table != foreign.id {
            return Err(err!(
                "link title field does not belong to the foreign table; field={}; title={}",
                field.id,
                title.id
            ));
        }

        Ok(Link {
            field,
            options,
            foreign,
            title,
        })
    }

    /// Resolves the link a lookup or rollup reads through.
    pub(crate) fn via(catalog: &'a Catalog, field: &'a Field) -> Result<Link<'a>> {
        let link = field
            .via_link()?
            .ok_or_else(|| err!("field does not read through a link; field={}", field.id))?;
        let link = catalog.field(&link)?;
        if link.table != field.table {
            return Err(err!(
                "link belongs to another table; field={}; link={}",
                field.id,
                link.id
            ));
        }
        Link::resolve(catalog, link)
    }

    pub(crate) fn source(&self, host_alias: &'a str) -> LinkSource<'_> {
        LinkSource {
            host_alias,
            fk_host_table: &self.options.fk_host_table_name,
            self_key: &self.options.self_key_name,
            foreign_key: &self.options.foreign_key_name,
            foreign_table: &self.foreign.db_table_name,
        }
    }

    /// Host records linked to any of `foreign` records.
    pub(crate) async fn hosts_linked_to(
        &self,
        conn: &mut dyn Connection,
        foreign: &[RecordId],
        page_size: usize,
    ) -> Result<IndexSet<RecordId>> {
        self.pairs(conn, &self.options.foreign_key_name, &self.options.self_key_name, foreign, page_size)
            .await
    }

    /// Foreign records linked from any of `hosts`.
    pub(crate) async fn foreign_linked_from(
        &self,
        conn: &mut dyn Connection,
        hosts: &[RecordId],
        page_size: usize,
    ) -> Result<IndexSet<RecordId>> {
        self.pairs(conn, &self.options.self_key_name, &self.options.foreign_key_name, hosts, page_size)
            .await
    }

    async fn pairs(
        &self,
        conn: &mut dyn Connection,
        match_column: &str,
        read_column: &str,
        ids: &[RecordId],
        page_size: usize,
    ) -> Result<IndexSet<RecordId>> {
        let mut ret = IndexSet::new();

        for chunk in ids.chunks(page_size.max(1)) {
            let select = Select::from(TableRef::new(&self.options.fk_host_table_name))
                .column(Expr::column(read_column))
                .filter(Expr::in_list(
                    Expr::column(match_column),
                    chunk.iter().map(|id| Value::from(id.as_str())),
                ))
                .filter(Expr::is_not_null(Expr::column(read_column)));

            for row in exec::query(conn, &select.into(), vec![Type::Text]).await? {
                if let Some(Value::String(id)) = row.into_iter().next() {
                    ret.insert(RecordId::new(id));
                }
            }
        }

        Ok(ret)
    }
}
