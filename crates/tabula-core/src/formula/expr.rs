use super::{visit, BinaryOp, Func, UnaryOp};
use crate::schema::FieldId;

use indexmap::IndexSet;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value
    Value(Literal),

    /// Reference to another field's value in the same record
    Field(ExprField),

    BinaryOp(ExprBinaryOp),

    UnaryOp(ExprUnaryOp),

    /// Call to one of the built-in functions
    Func(ExprFunc),

    /// A parenthesized expression. Kept explicitly so that printing an
    /// expression reproduces its grouping.
    Group(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprField {
    pub id: FieldId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprBinaryOp {
    pub lhs: Box<Expr>,
    pub op: BinaryOp,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprUnaryOp {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprFunc {
    pub func: Func,
    pub args: Vec<Expr>,
}

impl Expr {
    pub fn number(value: f64) -> Expr {
        Expr::Value(Literal::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::Value(Literal::String(value.into()))
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Value(Literal::Bool(value))
    }

    pub fn field(id: impl Into<FieldId>) -> Expr {
        Expr::Field(ExprField { id: id.into() })
    }

    pub fn binary_op(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::BinaryOp(ExprBinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        })
    }

    pub fn unary_op(op: UnaryOp, expr: Expr) -> Expr {
        Expr::UnaryOp(ExprUnaryOp {
            op,
            expr: Box::new(expr),
        })
    }

    pub fn func(func: Func, args: Vec<Expr>) -> Expr {
        Expr::Func(ExprFunc { func, args })
    }

    pub fn group(expr: Expr) -> Expr {
        Expr::Group(Box::new(expr))
    }

    /// Field identifiers referenced anywhere in the expression, in order of
    /// first appearance.
    pub fn field_refs(&self) -> IndexSet<FieldId> {
        let mut refs = IndexSet::new();
        visit::for_each_field(self, |expr| {
            refs.insert(expr.id.clone());
        });
        refs
    }
}
