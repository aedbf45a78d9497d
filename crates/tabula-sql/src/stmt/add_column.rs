use super::{ColumnDef, Statement};

#[derive(Debug, Clone)]
pub struct AddColumn {
    pub table: String,
    pub column: ColumnDef,
}

impl Statement {
    pub fn add_column(table: impl Into<String>, column: ColumnDef) -> Self {
        AddColumn {
            table: table.into(),
            column,
        }
        .into()
    }
}

impl From<AddColumn> for Statement {
    fn from(value: AddColumn) -> Self {
        Self::AddColumn(value)
    }
}
