use super::Expr;

use tabula_core::Type;

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub ty: Type,
    pub not_null: bool,
    pub primary_key: bool,
    pub default: Option<Expr>,

    /// Set for backend-generated columns
    pub generated: Option<Generated>,
}

#[derive(Debug, Clone)]
pub struct Generated {
    /// Defining expression, already serialized for the target flavor
    pub expr: String,

    /// `STORED` when true, `VIRTUAL` otherwise
    pub stored: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: Type) -> ColumnDef {
        ColumnDef {
            name: name.into(),
            ty,
            not_null: false,
            primary_key: false,
            default: None,
            generated: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default(mut self, expr: Expr) -> Self {
        self.default = Some(expr);
        self
    }

    pub fn generated(mut self, expr: impl Into<String>, stored: bool) -> Self {
        self.generated = Some(Generated {
            expr: expr.into(),
            stored,
        });
        self
    }
}
