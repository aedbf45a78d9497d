use crate::Value;

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Operation result, one vector of column values per row
    Values(Vec<Vec<Value>>),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn values(values: Vec<Vec<Value>>) -> Self {
        Self {
            rows: Rows::Values(values),
        }
    }

    /// Returns the rows of a query response.
    ///
    /// A count response yields no rows.
    pub fn into_values(self) -> Vec<Vec<Value>> {
        self.rows.into_values()
    }
}

impl Rows {
    pub fn into_count(self) -> u64 {
        match self {
            Rows::Count(count) => count,
            Rows::Values(values) => values.len() as u64,
        }
    }

    pub fn into_values(self) -> Vec<Vec<Value>> {
        match self {
            Self::Values(values) => values,
            Self::Count(_) => vec![],
        }
    }
}
