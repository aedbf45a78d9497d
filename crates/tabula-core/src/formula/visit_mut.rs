#![allow(unused_variables)]

use super::*;

pub trait VisitMut {
    fn visit_expr_mut(&mut self, i: &mut Expr) {
        visit_expr_mut(self, i);
    }

    fn visit_expr_binary_op_mut(&mut self, i: &mut ExprBinaryOp) {
        visit_expr_binary_op_mut(self, i);
    }

    fn visit_expr_func_mut(&mut self, i: &mut ExprFunc) {
        visit_expr_func_mut(self, i);
    }

    fn visit_expr_unary_op_mut(&mut self, i: &mut ExprUnaryOp) {
        visit_expr_unary_op_mut(self, i);
    }
}

pub fn visit_expr_mut<V>(v: &mut V, node: &mut Expr)
where
    V: VisitMut + ?Sized,
{
    match node {
        Expr::Value(_) | Expr::Field(_) => {}
        Expr::BinaryOp(expr) => v.visit_expr_binary_op_mut(expr),
        Expr::UnaryOp(expr) => v.visit_expr_unary_op_mut(expr),
        Expr::Func(expr) => v.visit_expr_func_mut(expr),
        Expr::Group(expr) => v.visit_expr_mut(expr),
    }
}

pub fn visit_expr_binary_op_mut<V>(v: &mut V, node: &mut ExprBinaryOp)
where
    V: VisitMut + ?Sized,
{
    v.visit_expr_mut(&mut node.lhs);
    v.visit_expr_mut(&mut node.rhs);
}

pub fn visit_expr_func_mut<V>(v: &mut V, node: &mut ExprFunc)
where
    V: VisitMut + ?Sized,
{
    for arg in &mut node.args {
        v.visit_expr_mut(arg);
    }
}

pub fn visit_expr_unary_op_mut<V>(v: &mut V, node: &mut ExprUnaryOp)
where
    V: VisitMut + ?Sized,
{
    v.visit_expr_mut(&mut node.expr);
}
