use super::{Comma, Formatter, Ident, Params, ToSql};

use crate::stmt::{self, Statement};

impl ToSql for &Statement {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Statement::AddColumn(stmt) => stmt.to_sql(f),
            Statement::CreateIndex(stmt) => stmt.to_sql(f),
            Statement::CreateTable(stmt) => stmt.to_sql(f),
            Statement::Delete(stmt) => stmt.to_sql(f),
            Statement::DropColumn(stmt) => stmt.to_sql(f),
            Statement::DropTable(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::ReferenceClosure(stmt) => stmt.to_sql(f),
            Statement::Select(stmt) => stmt.to_sql(f),
            Statement::Update(stmt) => stmt.to_sql(f),
            Statement::UpdateFrom(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &stmt::AddColumn {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let column = &self.column;
        fmt!(f, "ALTER TABLE " Ident(&self.table) " ADD COLUMN " column);
    }
}

impl ToSql for &stmt::CreateIndex {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let unique = if self.unique { "UNIQUE " } else { "" };
        let if_not_exists = if self.if_not_exists {
            "IF NOT EXISTS "
        } else {
            ""
        };
        let columns = Comma(self.columns.iter().map(Ident));

        fmt!(
            f, "CREATE " unique "INDEX " if_not_exists Ident(&self.name) " ON " Ident(&self.on) " (" columns ")"
        );
    }
}

impl ToSql for &stmt::CreateTable {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let if_not_exists = if self.if_not_exists {
            "IF NOT EXISTS "
        } else {
            ""
        };

        fmt!(f, "CREATE TABLE " if_not_exists Ident(&self.name) " (" Comma(&self.columns));

        if !self.primary_key.is_empty() {
            let pk = Comma(self.primary_key.iter().map(Ident));
            fmt!(f, ", PRIMARY KEY (" pk ")");
        }

        fmt!(f, ")");
    }
}

impl ToSql for &stmt::Delete {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "DELETE FROM " Ident(&self.from) Filter(self.filter.as_ref()));
    }
}

impl ToSql for &stmt::DropColumn {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "ALTER TABLE " Ident(&self.table) " DROP COLUMN " Ident(&self.name));
    }
}

impl ToSql for &stmt::DropTable {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let if_exists = if self.if_exists { "IF EXISTS " } else { "" };
        fmt!(f, "DROP TABLE " if_exists Ident(&self.name));
    }
}

impl ToSql for &stmt::Insert {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let columns = Comma(self.columns.iter().map(Ident));
        let rows = Comma(self.rows.iter().map(Row));

        fmt!(f, "INSERT INTO " Ident(&self.table) " (" columns ") VALUES " rows);
    }
}

struct Row<'a>(&'a Vec<stmt::Expr>);

impl ToSql for Row<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "(" Comma(self.0) ")");
    }
}

impl ToSql for &stmt::ReferenceClosure {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let table = Ident(&self.table);
        let from = Ident(&self.from_column);
        let to = Ident(&self.to_column);
        let seeds = stmt::Expr::in_list(stmt::Expr::column(&self.from_column), self.seeds.clone());
        let seeds = &seeds;

        fmt!(
            f,
            "WITH RECURSIVE closure(from_id, to_id) AS (SELECT " from ", " to " FROM " table " WHERE " seeds
            " UNION SELECT r." Ident(&self.from_column) ", r." Ident(&self.to_column) " FROM " Ident(&self.table)
            " AS r JOIN closure AS c ON r." Ident(&self.from_column) " = c.to_id) SELECT from_id, to_id FROM closure"
        );
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let from = &self.from;
        fmt!(f, "SELECT " Comma(&self.projection) " FROM " from);

        for join in &self.joins {
            let (table, on) = (&join.table, &join.on);
            fmt!(f, " JOIN " table " ON " on);
        }

        fmt!(f, Filter(self.filter.as_ref()));

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY " Comma(&self.order_by));
        }

        if let Some(limit) = self.limit {
            fmt!(f, " LIMIT " limit);
        }

        if let Some(offset) = self.offset {
            fmt!(f, " OFFSET " offset);
        }
    }
}

impl ToSql for &stmt::SelectItem {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let expr = &self.expr;
        fmt!(f, expr);
        if let Some(alias) = &self.alias {
            fmt!(f, " AS " Ident(alias));
        }
    }
}

impl ToSql for &stmt::TableRef {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(&self.name));
        if let Some(alias) = &self.alias {
            fmt!(f, " AS " alias);
        }
    }
}

impl ToSql for &stmt::Update {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let assignments = Comma(self.assignments.iter().map(|(column, expr)| Assignment(column, expr)));
        fmt!(f, "UPDATE " Ident(&self.table) " SET " assignments Filter(self.filter.as_ref()));
    }
}

struct Assignment<'a>(&'a String, &'a stmt::Expr);

impl ToSql for Assignment<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = " self.1);
    }
}

impl ToSql for &stmt::UpdateFrom {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let alias = &self.alias;
        let source = &self.source;
        let source_alias = &self.source_alias;
        let assignments = Comma(
            self.assignments
                .iter()
                .map(|(target, column)| SourceAssignment(target, source_alias, column)),
        );

        fmt!(
            f,
            "UPDATE " Ident(&self.table) " AS " alias " SET " assignments
            " FROM (" source ") AS " source_alias
            " WHERE " alias "." Ident(&self.key) " = " source_alias "." Ident(&self.key)
        );

        if !self.returning.is_empty() {
            // SQLite only lets RETURNING name columns of the updated table and
            // rejects qualified names; PostgreSQL needs the qualifier because
            // the source exposes the same column names.
            let qualifier = if f.serializer.is_sqlite() {
                None
            } else {
                Some(self.alias.as_str())
            };
            let returning = Comma(self.returning.iter().map(|column| Returning(qualifier, column)));
            fmt!(f, " RETURNING " returning);
        }
    }
}

struct SourceAssignment<'a>(&'a String, &'a String, &'a String);

impl ToSql for SourceAssignment<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = " self.1 "." Ident(self.2));
    }
}

struct Returning<'a>(Option<&'a str>, &'a String);

impl ToSql for Returning<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if let Some(qualifier) = self.0 {
            fmt!(f, qualifier ".");
        }
        fmt!(f, Ident(self.1));
    }
}

struct Filter<'a>(Option<&'a stmt::Expr>);

impl ToSql for Filter<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if let Some(expr) = self.0 {
            fmt!(f, " WHERE " expr);
        }
    }
}
