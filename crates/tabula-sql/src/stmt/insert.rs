use super::{Expr, Statement};

use tabula_core::Value;

#[derive(Debug, Clone)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Expr>>,
}

impl Statement {
    /// Inserts rows of parameter values.
    pub fn insert(
        table: impl Into<String>,
        columns: Vec<String>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Self {
        Insert {
            table: table.into(),
            columns,
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Expr::Value).collect())
                .collect(),
        }
        .into()
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}
