use chrono::{DateTime, Utc};

/// Configuration for the computed-value engine
#[derive(Debug, Clone)]
pub struct Config {
    /// Records per evaluator query and per bulk recompute page
    page_size: usize,

    /// How the reference closure is computed
    pub closure: Closure,

    /// Whether formula fields may be backed by generated columns
    pub generated_columns: GeneratedColumns,

    /// Fixed clock for "now" constants captured in generated columns
    pub now: Option<DateTime<Utc>>,
}

/// Strategy used to close over the reference relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    /// Load the edges once and walk them in memory
    Iterative,

    /// Ask the database with a single `WITH RECURSIVE` query
    RecursiveQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedColumns {
    /// Honour the `dbGenerated` option of formula fields
    Honor,

    /// Always store formula values in plain columns
    Never,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 500,
            closure: Closure::Iterative,
            generated_columns: GeneratedColumns::Honor,
            now: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of records handled per query. Zero is treated as one.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the closure strategy
    pub fn closure(mut self, closure: Closure) -> Self {
        self.closure = closure;
        self
    }

    pub fn generated_columns(mut self, generated_columns: GeneratedColumns) -> Self {
        self.generated_columns = generated_columns;
        self
    }

    /// Pin the clock used when a generated column captures "now"
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Records handled per query, never zero.
    pub fn batch_size(&self) -> usize {
        self.page_size.max(1)
    }

    pub(crate) fn clock(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}
