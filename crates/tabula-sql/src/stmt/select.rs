use super::{Expr, Statement};

#[derive(Debug, Clone)]
pub struct Select {
    pub projection: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub filter: Option<Expr>,
    pub order_by: Vec<Expr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

/// Inner join
#[derive(Debug, Clone)]
pub struct Join {
    pub table: TableRef,
    pub on: Expr,
}

impl Select {
    pub fn from(table: TableRef) -> Select {
        Select {
            projection: vec![],
            from: table,
            joins: vec![],
            filter: None,
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn column(mut self, expr: Expr) -> Self {
        self.projection.push(SelectItem { expr, alias: None });
        self
    }

    pub fn column_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.projection.push(SelectItem {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    pub fn join(mut self, table: TableRef, on: Expr) -> Self {
        self.joins.push(Join { table, on });
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::and([existing, expr]),
            None => expr,
        });
        self
    }

    pub fn order_by(mut self, expr: Expr) -> Self {
        self.order_by.push(expr);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> TableRef {
        TableRef {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> TableRef {
        TableRef {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Self::Select(value)
    }
}
