use super::Operation;

use crate::{Type, Value};

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// The SQL text, already serialized for the connection's flavor
    pub sql: String,

    /// Positional parameters referenced by the SQL placeholders
    pub params: Vec<Value>,

    /// The type of each returned column. `None` when the statement returns no
    /// rows and only the affected row count is of interest.
    pub ret: Option<Vec<Type>>,
}

impl QuerySql {
    /// A statement that returns no rows.
    pub fn execute(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            ret: None,
        }
    }

    /// A statement returning rows with the given column types.
    pub fn query(sql: impl Into<String>, params: Vec<Value>, ret: Vec<Type>) -> Self {
        Self {
            sql: sql.into(),
            params,
            ret: Some(ret),
        }
    }
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}
