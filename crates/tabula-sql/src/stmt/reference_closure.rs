use super::Statement;

use tabula_core::Value;

/// Closes over an edge relation in one recursive query, starting from the
/// edges leaving `seeds`. Returns `(from, to)` pairs.
///
/// `UNION` (not `UNION ALL`) deduplicates pairs, so the query terminates even
/// if the stored relation were to contain a cycle.
#[derive(Debug, Clone)]
pub struct ReferenceClosure {
    pub table: String,
    pub from_column: String,
    pub to_column: String,
    pub seeds: Vec<Value>,
}

impl From<ReferenceClosure> for Statement {
    fn from(value: ReferenceClosure) -> Self {
        Self::ReferenceClosure(value)
    }
}
