#![allow(unused_variables)]

use super::*;

pub trait Visit {
    fn visit_expr(&mut self, i: &Expr) {
        visit_expr(self, i);
    }

    fn visit_expr_binary_op(&mut self, i: &ExprBinaryOp) {
        visit_expr_binary_op(self, i);
    }

    fn visit_expr_field(&mut self, i: &ExprField) {
        visit_expr_field(self, i);
    }

    fn visit_expr_func(&mut self, i: &ExprFunc) {
        visit_expr_func(self, i);
    }

    fn visit_expr_unary_op(&mut self, i: &ExprUnaryOp) {
        visit_expr_unary_op(self, i);
    }

    fn visit_literal(&mut self, i: &Literal) {
        visit_literal(self, i);
    }
}

pub fn visit_expr<V>(v: &mut V, node: &Expr)
where
    V: Visit + ?Sized,
{
    match node {
        Expr::Value(expr) => v.visit_literal(expr),
        Expr::Field(expr) => v.visit_expr_field(expr),
        Expr::BinaryOp(expr) => v.visit_expr_binary_op(expr),
        Expr::UnaryOp(expr) => v.visit_expr_unary_op(expr),
        Expr::Func(expr) => v.visit_expr_func(expr),
        Expr::Group(expr) => v.visit_expr(expr),
    }
}

pub fn visit_expr_binary_op<V>(v: &mut V, node: &ExprBinaryOp)
where
    V: Visit + ?Sized,
{
    v.visit_expr(&node.lhs);
    v.visit_expr(&node.rhs);
}

pub fn visit_expr_field<V>(v: &mut V, node: &ExprField)
where
    V: Visit + ?Sized,
{
}

pub fn visit_expr_func<V>(v: &mut V, node: &ExprFunc)
where
    V: Visit + ?Sized,
{
    for arg in &node.args {
        v.visit_expr(arg);
    }
}

pub fn visit_expr_unary_op<V>(v: &mut V, node: &ExprUnaryOp)
where
    V: Visit + ?Sized,
{
    v.visit_expr(&node.expr);
}

pub fn visit_literal<V>(v: &mut V, node: &Literal)
where
    V: Visit + ?Sized,
{
}

/// Calls `f` for every field reference in `expr`.
pub fn for_each_field<F>(expr: &Expr, f: F)
where
    F: FnMut(&ExprField),
{
    struct ForEach<F> {
        f: F,
    }

    impl<F> Visit for ForEach<F>
    where
        F: FnMut(&ExprField),
    {
        fn visit_expr_field(&mut self, i: &ExprField) {
            (self.f)(i);
        }
    }

    ForEach { f }.visit_expr(expr);
}
