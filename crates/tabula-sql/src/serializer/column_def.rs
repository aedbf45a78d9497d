use super::{Formatter, Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::ColumnDef {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(&self.name) " " self.ty);

        if self.primary_key {
            fmt!(f, " PRIMARY KEY");
        }

        if self.not_null {
            fmt!(f, " NOT NULL");
        }

        if let Some(default) = &self.default {
            fmt!(f, " DEFAULT " default);
        }

        if let Some(generated) = &self.generated {
            let storage = if generated.stored { "STORED" } else { "VIRTUAL" };
            let expr = &generated.expr;
            fmt!(f, " GENERATED ALWAYS AS (" expr ") " storage);
        }
    }
}
