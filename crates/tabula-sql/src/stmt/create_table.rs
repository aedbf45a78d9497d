use super::{ColumnDef, Statement};

#[derive(Debug, Clone)]
pub struct CreateTable {
    /// Name of the table
    pub name: String,

    /// Column definitions
    pub columns: Vec<ColumnDef>,

    /// Composite primary key clause, when no single column is marked as the
    /// primary key
    pub primary_key: Vec<String>,

    pub if_not_exists: bool,
}

impl Statement {
    pub fn create_table(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        CreateTable {
            name: name.into(),
            columns,
            primary_key: vec![],
            if_not_exists: false,
        }
        .into()
    }

    pub fn create_table_if_not_exists(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        CreateTable {
            name: name.into(),
            columns,
            primary_key: vec![],
            if_not_exists: true,
        }
        .into()
    }
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}
