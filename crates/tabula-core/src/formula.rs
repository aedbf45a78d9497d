//! The formula language: AST, parser and printer.
//!
//! The grammar is deliberately small. Compilation to SQL lives in
//! `tabula-sql`; this module only deals with the shape of expressions.

mod display;

mod expr;
pub use expr::{Expr, ExprBinaryOp, ExprField, ExprFunc, ExprUnaryOp, Literal};

mod func;
pub use func::{Func, FuncCategory};

mod op;
pub use op::{BinaryOp, UnaryOp};

mod parse;
pub use parse::parse;

pub mod visit;
pub use visit::Visit;

pub mod visit_mut;
pub use visit_mut::VisitMut;
