use super::{Expr, Select, Statement};

/// Plain `UPDATE .. SET .. WHERE ..`
#[derive(Debug, Clone)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, Expr)>,
    pub filter: Option<Expr>,
}

/// Refreshes stored columns from a projection over the same table, in one
/// statement:
///
/// ```sql
/// UPDATE tbl AS u SET col = s.v0 FROM (SELECT ..) AS s
/// WHERE u.key = s.key RETURNING ..
/// ```
#[derive(Debug, Clone)]
pub struct UpdateFrom {
    pub table: String,

    /// Alias for the update target
    pub alias: String,

    /// `(target column, source column)` pairs
    pub assignments: Vec<(String, String)>,

    pub source: Select,

    pub source_alias: String,

    /// Column matched between target and source
    pub key: String,

    /// Target columns returned after the update
    pub returning: Vec<String>,
}

impl Statement {
    pub fn update(table: impl Into<String>, assignments: Vec<(String, Expr)>, filter: Expr) -> Self {
        Update {
            table: table.into(),
            assignments,
            filter: Some(filter),
        }
        .into()
    }
}

impl From<Update> for Statement {
    fn from(value: Update) -> Self {
        Self::Update(value)
    }
}

impl From<UpdateFrom> for Statement {
    fn from(value: UpdateFrom) -> Self {
        Self::UpdateFrom(value)
    }
}
