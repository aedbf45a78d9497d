use super::{Expr, Literal};

use core::fmt;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Value(literal) => literal.fmt(f),
            Expr::Field(expr) => write!(f, "{{{}}}", expr.id),
            Expr::BinaryOp(expr) => write!(f, "{} {} {}", expr.lhs, expr.op.as_str(), expr.rhs),
            Expr::UnaryOp(expr) => write!(f, "{}{}", expr.op.as_str(), expr.expr),
            Expr::Func(expr) => {
                write!(f, "{}(", expr.func.name())?;
                for (i, arg) in expr.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    arg.fmt(f)?;
                }
                f.write_str(")")
            }
            Expr::Group(expr) => write!(f, "({expr})"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(v) => write!(f, "{v}"),
            Literal::String(v) => {
                f.write_str("\"")?;
                for c in v.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Literal::Bool(true) => f.write_str("TRUE"),
            Literal::Bool(false) => f.write_str("FALSE"),
        }
    }
}
