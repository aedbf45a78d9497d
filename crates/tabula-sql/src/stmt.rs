//! The small statement model the engine issues.
//!
//! Formula SQL produced by the [`Generator`](crate::Generator) is carried as
//! [`Expr::Raw`]; everything else is structured so values travel as
//! parameters.

mod add_column;
pub use add_column::AddColumn;

mod column_def;
pub use column_def::{ColumnDef, Generated};

mod create_index;
pub use create_index::CreateIndex;

mod create_table;
pub use create_table::CreateTable;

mod delete;
pub use delete::Delete;

mod drop_column;
pub use drop_column::DropColumn;

mod drop_table;
pub use drop_table::DropTable;

mod expr;
pub use expr::{BinaryOp, Expr, ExprBinaryOp, ExprColumn, ExprInList};

mod insert;
pub use insert::Insert;

mod reference_closure;
pub use reference_closure::ReferenceClosure;

mod select;
pub use select::{Join, Select, SelectItem, TableRef};

mod update;
pub use update::{Update, UpdateFrom};

#[derive(Debug, Clone)]
pub enum Statement {
    AddColumn(AddColumn),
    CreateIndex(CreateIndex),
    CreateTable(CreateTable),
    Delete(Delete),
    DropColumn(DropColumn),
    DropTable(DropTable),
    Insert(Insert),
    ReferenceClosure(ReferenceClosure),
    Select(Select),
    Update(Update),
    UpdateFrom(UpdateFrom),
}

impl Statement {
    /// Returns the number of returned columns within the statement (if one
    /// exists).
    pub fn returning_len(&self) -> Option<usize> {
        match self {
            Statement::Select(select) => Some(select.projection.len()),
            Statement::UpdateFrom(update) if !update.returning.is_empty() => {
                Some(update.returning.len())
            }
            Statement::ReferenceClosure(_) => Some(2),
            _ => None,
        }
    }
}
