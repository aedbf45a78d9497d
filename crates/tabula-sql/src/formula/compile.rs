use super::{Fragment, Generator, Ty};

use indexmap::{IndexMap, IndexSet};
use tabula_core::{
    formula::{Expr, Func},
    schema::{FieldId, ID_COLUMN},
    Error, Result, Type,
};

/// Resolves field references to the SQL that reads them.
#[derive(Debug, Clone)]
pub struct CompileContext {
    columns: IndexMap<FieldId, ColumnRef>,

    /// SQL reading the record's id, used by `RECORD_ID()`
    record_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub sql: String,
    pub ty: Type,
}

/// A compiled formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub sql: String,

    /// Type the expression evaluates to
    pub ty: Type,

    /// Fields the expression references, in order of first appearance
    pub dependencies: IndexSet<FieldId>,
}

impl CompileContext {
    /// Columns are referenced unqualified, as in a generated column's
    /// defining expression.
    pub fn unqualified(generator: &Generator) -> CompileContext {
        CompileContext {
            columns: IndexMap::new(),
            record_id: generator.ident(ID_COLUMN),
        }
    }

    /// Columns are referenced through a table alias, as in a projection.
    pub fn qualified(generator: &Generator, alias: &str) -> CompileContext {
        CompileContext {
            columns: IndexMap::new(),
            record_id: generator.qualified(alias, ID_COLUMN),
        }
    }

    pub fn insert(&mut self, field: FieldId, sql: impl Into<String>, ty: Type) {
        self.columns.insert(
            field,
            ColumnRef {
                sql: sql.into(),
                ty,
            },
        );
    }

    pub fn with(mut self, field: impl Into<FieldId>, sql: impl Into<String>, ty: Type) -> Self {
        self.insert(field.into(), sql, ty);
        self
    }

    pub fn get(&self, field: &FieldId) -> Option<&ColumnRef> {
        self.columns.get(field)
    }
}

impl Generator {
    /// Compiles a formula expression to a SQL expression.
    pub fn compile(&self, expr: &Expr, cx: &CompileContext) -> Result<Compiled> {
        let fragment = self.compile_expr(expr, cx)?;
        Ok(Compiled {
            sql: fragment.sql,
            ty: fragment.ty.to_type(),
            dependencies: expr.field_refs(),
        })
    }

    fn compile_expr(&self, expr: &Expr, cx: &CompileContext) -> Result<Fragment> {
        match expr {
            Expr::Value(lit) => Ok(self.literal(lit)),
            Expr::Field(field) => {
                let column = cx
                    .get(&field.id)
                    .ok_or_else(|| Error::unknown_field(field.id.as_str()))?;
                Ok(self.column(column.sql.clone(), column.ty))
            }
            Expr::BinaryOp(expr) => {
                let lhs = self.compile_expr(&expr.lhs, cx)?;
                let rhs = self.compile_expr(&expr.rhs, cx)?;
                self.binary_op(expr.op, lhs, rhs)
            }
            Expr::UnaryOp(expr) => {
                let operand = self.compile_expr(&expr.expr, cx)?;
                self.unary_op(expr.op, operand)
            }
            Expr::Func(call) if call.func == Func::RecordId => {
                Ok(Fragment::new(cx.record_id.clone(), Ty::Text))
            }
            Expr::Func(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.compile_expr(arg, cx))
                    .collect::<Result<Vec<_>>>()?;
                self.func(call.func, args)
            }
            Expr::Group(expr) => self.compile_expr(expr, cx),
        }
    }
}
