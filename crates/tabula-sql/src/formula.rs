//! Formula compilation: the per-flavor [`Generator`], the expression walker
//! and the expansion pass for generated columns.

mod compile;
pub use compile::{ColumnRef, CompileContext, Compiled};

mod derived;
pub use derived::LinkSource;

pub mod expand;
pub use expand::ExpandContext;

mod func;

mod generator;
pub use generator::{Fragment, Generator, Ty};
