use super::{generator::string_literal, Generator};

use tabula_core::{driver::Flavor, schema::RollupFunction, schema::ID_COLUMN, Type};

/// Physical location of a link's pairs, relative to the host table of the
/// enclosing query.
///
/// Rows of `fk_host_table` whose `self_key` column equals the host record id
/// carry a linked foreign record id in `foreign_key`.
#[derive(Debug, Clone, Copy)]
pub struct LinkSource<'a> {
    /// Alias of the host table in the enclosing query
    pub host_alias: &'a str,
    pub fk_host_table: &'a str,
    pub self_key: &'a str,
    pub foreign_key: &'a str,
    pub foreign_table: &'a str,
}

impl Generator {
    /// Correlated subquery producing a link cell: a JSON array of
    /// `{"id", "title"}` objects ordered by foreign record id, `NULL` or
    /// empty when nothing is linked.
    pub fn link_cell(&self, src: &LinkSource<'_>, title_column: &str, title_ty: Type) -> String {
        let id = self.qualified("f", ID_COLUMN);
        let title = self.qualified("f", title_column);

        match self.flavor() {
            Flavor::Postgresql => format!(
                "(SELECT jsonb_agg(jsonb_build_object('id', {id}, 'title', {title}) ORDER BY {id}) {})",
                self.link_join(src)
            ),
            Flavor::Sqlite => {
                let title_json = self.sqlite_json_value("x.title", title_ty);
                format!(
                    "(SELECT json_group_array(json_object('id', x.id, 'title', {title_json})) FROM (SELECT {id} AS id, {title} AS title {} ORDER BY {id}) AS x)",
                    self.link_join(src)
                )
            }
        }
    }

    /// Correlated subquery producing a lookup cell: a JSON array of the
    /// looked-up values ordered by foreign record id.
    pub fn lookup_cell(&self, src: &LinkSource<'_>, column: &str, ty: Type) -> String {
        let id = self.qualified("f", ID_COLUMN);
        let value = self.qualified("f", column);

        match self.flavor() {
            Flavor::Postgresql => format!(
                "(SELECT jsonb_agg({value} ORDER BY {id}) {})",
                self.link_join(src)
            ),
            Flavor::Sqlite => {
                let value_json = self.sqlite_json_value("x.v", ty);
                format!(
                    "(SELECT json_group_array({value_json}) FROM (SELECT {value} AS v {} ORDER BY {id}) AS x)",
                    self.link_join(src)
                )
            }
        }
    }

    /// Correlated subquery aggregating the linked values to a scalar.
    pub fn rollup_cell(
        &self,
        src: &LinkSource<'_>,
        function: RollupFunction,
        column: &str,
    ) -> String {
        let id = self.qualified("f", ID_COLUMN);
        let value = self.qualified("f", column);
        let join = self.link_join(src);
        let separator = string_literal(", ");

        let aggregate = match function {
            RollupFunction::Sum => format!("SUM({value})"),
            RollupFunction::Average => format!("AVG({value})"),
            RollupFunction::Max => format!("MAX({value})"),
            RollupFunction::Min => format!("MIN({value})"),
            RollupFunction::Count => format!("COUNT({id})"),
            RollupFunction::Counta => format!("COUNT({value})"),
            RollupFunction::Concatenate => {
                return match self.flavor() {
                    Flavor::Postgresql => format!(
                        "(SELECT STRING_AGG(CAST({value} AS TEXT), {separator} ORDER BY {id}) {join})"
                    ),
                    Flavor::Sqlite => format!(
                        "(SELECT GROUP_CONCAT(x.v, {separator}) FROM (SELECT {value} AS v {join} ORDER BY {id}) AS x)"
                    ),
                }
            }
        };

        format!("(SELECT {aggregate} {join})")
    }

    fn link_join(&self, src: &LinkSource<'_>) -> String {
        format!(
            "FROM {} AS j JOIN {} AS f ON {} = {} WHERE {} = {}",
            self.ident(src.fk_host_table),
            self.ident(src.foreign_table),
            self.qualified("f", ID_COLUMN),
            self.qualified("j", src.foreign_key),
            self.qualified("j", src.self_key),
            self.qualified(src.host_alias, ID_COLUMN),
        )
    }

    /// SQLite stores JSON and booleans as text and integers; lift them back
    /// to JSON values so cells match PostgreSQL's `jsonb` output.
    fn sqlite_json_value(&self, sql: &str, ty: Type) -> String {
        match ty {
            Type::Json => format!("json({sql})"),
            Type::Boolean => format!(
                "json(CASE WHEN {sql} IS NULL THEN 'null' WHEN {sql} THEN 'true' ELSE 'false' END)"
            ),
            _ => sql.to_string(),
        }
    }
}
