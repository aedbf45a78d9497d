use tabula_core::Value;

#[derive(Debug, Clone)]
pub enum Expr {
    /// Column reference, optionally qualified by a table alias
    Column(ExprColumn),

    /// A value bound as a statement parameter
    Value(Value),

    /// SQL text already serialized for the target flavor
    Raw(String),

    BinaryOp(ExprBinaryOp),

    /// Conjunction of every operand; empty is `TRUE`
    And(Vec<Expr>),

    InList(ExprInList),

    IsNull(Box<Expr>),

    IsNotNull(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct ExprColumn {
    pub table: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ExprBinaryOp {
    pub lhs: Box<Expr>,
    pub op: BinaryOp,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
}

#[derive(Debug, Clone)]
pub struct ExprInList {
    pub expr: Box<Expr>,
    pub list: Vec<Value>,
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Expr {
        Expr::Column(ExprColumn {
            table: None,
            name: name.into(),
        })
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Expr {
        Expr::Column(ExprColumn {
            table: Some(table.into()),
            name: name.into(),
        })
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn raw(sql: impl Into<String>) -> Expr {
        Expr::Raw(sql.into())
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    pub fn binary_op(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        Expr::BinaryOp(ExprBinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        })
    }

    pub fn in_list<V: Into<Value>>(expr: Expr, list: impl IntoIterator<Item = V>) -> Expr {
        Expr::InList(ExprInList {
            expr: Box::new(expr),
            list: list.into_iter().map(Into::into).collect(),
        })
    }

    pub fn is_not_null(expr: Expr) -> Expr {
        Expr::IsNotNull(Box::new(expr))
    }

    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(operands.into_iter().collect())
    }
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
        }
    }
}
