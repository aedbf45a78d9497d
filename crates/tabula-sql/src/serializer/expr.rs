use super::{Delimited, Formatter, Ident, Params, ToSql};

use crate::stmt::{self, Expr};

impl ToSql for &Expr {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Expr::Column(expr) => expr.to_sql(f),
            Expr::Value(value) => {
                let placeholder = f.params.push(value);
                placeholder.to_sql(f);
            }
            Expr::Raw(sql) => f.dst.push_str(sql),
            Expr::BinaryOp(expr) => {
                let lhs = &*expr.lhs;
                let rhs = &*expr.rhs;
                fmt!(f, lhs " " expr.op.as_str() " " rhs);
            }
            Expr::And(operands) if operands.is_empty() => fmt!(f, "1 = 1"),
            Expr::And(operands) => fmt!(f, Delimited(operands, " AND ")),
            Expr::InList(expr) if expr.list.is_empty() => fmt!(f, "1 = 0"),
            Expr::InList(expr) => {
                let lhs = &*expr.expr;
                fmt!(f, lhs " IN (" InList(&expr.list) ")");
            }
            Expr::IsNull(expr) => {
                let expr = &**expr;
                fmt!(f, expr " IS NULL");
            }
            Expr::IsNotNull(expr) => {
                let expr = &**expr;
                fmt!(f, expr " IS NOT NULL");
            }
        }
    }
}

impl ToSql for &stmt::ExprColumn {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if let Some(table) = &self.table {
            fmt!(f, table ".");
        }
        fmt!(f, Ident(&self.name));
    }
}

struct InList<'a>(&'a [tabula_core::Value]);

impl ToSql for InList<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let mut s = "";
        for value in self.0 {
            let placeholder = f.params.push(value);
            fmt!(f, s placeholder);
            s = ", ";
        }
    }
}
