use crate::serializer::quote_ident;

use chrono::{DateTime, SecondsFormat, Utc};
use tabula_core::{
    driver::Flavor,
    formula::{BinaryOp, Literal, UnaryOp},
    Error, Result, Type,
};

/// Text accepted as a number: the JSON number grammar.
const NUMERIC_TEXT: &str = "^-?(0|[1-9][0-9]*)([.][0-9]+)?([eE][+-]?[0-9]+)?$";

/// Maps single formula operations to SQL for one flavor.
///
/// The generator holds no state besides the flavor and whether it compiles
/// the defining expression of a generated column. In that mode volatile
/// functions are rendered as the `now` constant captured at construction,
/// and anything the backend would refuse in a generated column is rejected
/// with `unsupported_function`.
#[derive(Debug, Clone)]
pub struct Generator {
    flavor: Flavor,
    generated: bool,
    now: DateTime<Utc>,
}

/// An operand or result: SQL text plus the type it evaluates to.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub ty: Ty,

    /// Set when the fragment is a literal, so functions can specialize on
    /// constant arguments.
    pub literal: Option<Literal>,
}

/// Static type of a compiled fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Number,
    Text,
    Boolean,
    DateTime,
    Json,
    /// `NULL` literal, compatible with everything
    Null,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, ty: Ty) -> Fragment {
        Fragment {
            sql: sql.into(),
            ty,
            literal: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.ty == Ty::Null
    }

    /// The literal integer value of the fragment, if it is one.
    pub(super) fn as_int(&self) -> Option<i64> {
        match self.literal {
            Some(Literal::Number(v)) if v.fract() == 0.0 && v.abs() < 1e15 => Some(v as i64),
            _ => None,
        }
    }

    pub(super) fn as_str(&self) -> Option<&str> {
        match &self.literal {
            Some(Literal::String(v)) => Some(v),
            _ => None,
        }
    }
}

impl Ty {
    pub fn from_type(ty: Type) -> Ty {
        match ty {
            Type::Text => Ty::Text,
            Type::Number | Type::Integer => Ty::Number,
            Type::Boolean => Ty::Boolean,
            Type::DateTime => Ty::DateTime,
            Type::Json => Ty::Json,
        }
    }

    /// Storage type for a column holding values of this type.
    pub fn to_type(self) -> Type {
        match self {
            Ty::Number => Type::Number,
            Ty::Text | Ty::Null => Type::Text,
            Ty::Boolean => Type::Boolean,
            Ty::DateTime => Type::DateTime,
            Ty::Json => Type::Json,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Ty::Null => "null",
            ty => ty.to_type().name(),
        }
    }
}

impl Generator {
    /// Generator for queries evaluated by the engine.
    pub fn new(flavor: Flavor) -> Generator {
        Generator {
            flavor,
            generated: false,
            now: Utc::now(),
        }
    }

    /// Generator for the defining expression of a generated column.
    pub fn for_generated_column(flavor: Flavor, now: DateTime<Utc>) -> Generator {
        Generator {
            flavor,
            generated: true,
            now,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn ident(&self, name: &str) -> String {
        quote_ident(self.flavor, name)
    }

    /// `alias.column`
    pub fn qualified(&self, alias: &str, name: &str) -> String {
        format!("{alias}.{}", self.ident(name))
    }

    pub(super) fn is_postgresql(&self) -> bool {
        self.flavor == Flavor::Postgresql
    }

    pub(super) fn unsupported(&self, what: &str) -> Error {
        Error::unsupported_function(what, self.flavor.name())
    }

    pub fn literal(&self, lit: &Literal) -> Fragment {
        let (sql, ty) = match lit {
            Literal::Number(v) => (number_literal(*v), Ty::Number),
            Literal::String(v) => (string_literal(v), Ty::Text),
            Literal::Bool(v) => (self.bool_literal(*v).to_string(), Ty::Boolean),
        };
        Fragment {
            sql,
            ty,
            literal: Some(lit.clone()),
        }
    }

    pub fn null(&self) -> Fragment {
        Fragment::new("NULL", Ty::Null)
    }

    /// A reference to a column holding values of `ty`.
    pub fn column(&self, sql: impl Into<String>, ty: Type) -> Fragment {
        Fragment::new(sql, Ty::from_type(ty))
    }

    pub fn bool_literal(&self, value: bool) -> &'static str {
        match (self.flavor, value) {
            (Flavor::Postgresql, true) => "TRUE",
            (Flavor::Postgresql, false) => "FALSE",
            (Flavor::Sqlite, true) => "1",
            (Flavor::Sqlite, false) => "0",
        }
    }

    /// The current time: a volatile call, or the captured constant when
    /// compiling a generated column.
    pub(super) fn now(&self, truncate_to_day: bool) -> Fragment {
        let sql = if self.generated {
            let now = if truncate_to_day {
                self.now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .map(|naive| naive.and_utc())
                    .unwrap_or(self.now)
            } else {
                self.now
            };
            let text = string_literal(&now.to_rfc3339_opts(SecondsFormat::Millis, true));
            match self.flavor {
                Flavor::Postgresql => format!("{text}::timestamptz"),
                Flavor::Sqlite => text,
            }
        } else {
            match (self.flavor, truncate_to_day) {
                (Flavor::Postgresql, false) => "NOW()".to_string(),
                (Flavor::Postgresql, true) => {
                    "(DATE_TRUNC('day', NOW() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC')".to_string()
                }
                (Flavor::Sqlite, false) => "STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')".to_string(),
                (Flavor::Sqlite, true) => "STRFTIME('%Y-%m-%dT00:00:00.000Z', 'now')".to_string(),
            }
        };
        Fragment::new(sql, Ty::DateTime)
    }

    /// Coerces an operand to a number.
    pub(super) fn num(&self, arg: &Fragment) -> Result<String> {
        let sql = &arg.sql;
        Ok(match (arg.ty, self.flavor) {
            (Ty::Number | Ty::Null, _) => sql.clone(),
            (Ty::Boolean, Flavor::Postgresql) => format!("({sql})::int"),
            (Ty::Boolean, Flavor::Sqlite) => sql.clone(),
            // Text that is not a JSON-style number converts to NULL on both
            // flavors.
            (Ty::Text, Flavor::Postgresql) => format!(
                "(CASE WHEN TRIM({sql}) ~ '{NUMERIC_TEXT}' THEN CAST(TRIM({sql}) AS DOUBLE PRECISION) END)"
            ),
            (Ty::Text, Flavor::Sqlite) => format!(
                "(CASE WHEN JSON_VALID(TRIM({sql})) THEN CASE WHEN JSON_TYPE(TRIM({sql})) IN ('integer', 'real') THEN CAST(TRIM({sql}) AS REAL) END END)"
            ),
            (ty @ (Ty::DateTime | Ty::Json), _) => {
                return Err(Error::invalid_formula(format!(
                    "expected a number, found a {} value",
                    ty.name()
                )))
            }
        })
    }

    /// Coerces an operand to text.
    pub(super) fn text(&self, arg: &Fragment) -> Result<String> {
        let sql = &arg.sql;
        Ok(match (arg.ty, self.flavor) {
            (Ty::Text | Ty::Null, _) => sql.clone(),
            (Ty::Number, Flavor::Postgresql) => {
                if self.generated {
                    return Err(self.unsupported("number to text conversion"));
                }
                format!("CAST({sql} AS TEXT)")
            }
            // Integral reals print without the trailing `.0`, matching
            // PostgreSQL's float output.
            (Ty::Number, Flavor::Sqlite) => format!(
                "(CASE WHEN {sql} = CAST({sql} AS INTEGER) THEN CAST(CAST({sql} AS INTEGER) AS TEXT) ELSE CAST({sql} AS TEXT) END)"
            ),
            (Ty::Boolean, _) => format!(
                "(CASE WHEN {sql} IS NULL THEN NULL WHEN {sql} THEN 'true' ELSE 'false' END)"
            ),
            (Ty::DateTime, Flavor::Postgresql) => {
                if self.generated {
                    return Err(self.unsupported("date to text conversion"));
                }
                format!("TO_CHAR(({sql}) AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS.MS\"Z\"')")
            }
            (Ty::DateTime | Ty::Json, Flavor::Sqlite) => sql.clone(),
            (Ty::Json, Flavor::Postgresql) => format!("({sql})::text"),
        })
    }

    /// Coerces an operand to a condition.
    pub(super) fn truthy(&self, arg: &Fragment) -> String {
        let sql = &arg.sql;
        let false_ = self.bool_literal(false);
        match arg.ty {
            Ty::Boolean => sql.clone(),
            Ty::Null => false_.to_string(),
            Ty::Number => format!("COALESCE({sql} <> 0, {false_})"),
            Ty::Text => format!("COALESCE({sql} <> '', {false_})"),
            Ty::DateTime | Ty::Json => format!("({sql} IS NOT NULL)"),
        }
    }

    /// Coerces a timestamp operand for date arithmetic and part extraction.
    pub(super) fn timestamp(&self, arg: &Fragment, func: &str) -> Result<String> {
        let sql = &arg.sql;
        match (arg.ty, self.flavor) {
            (Ty::DateTime | Ty::Null, _) | (Ty::Text, Flavor::Sqlite) => Ok(sql.clone()),
            (Ty::Text, Flavor::Postgresql) => {
                if self.generated {
                    return Err(self.unsupported(func));
                }
                Ok(format!("({sql})::timestamptz"))
            }
            (ty, _) => Err(Error::invalid_formula(format!(
                "{func} expects a date, found a {} value",
                ty.name()
            ))),
        }
    }

    /// An integer operand for PostgreSQL functions that reject doubles.
    pub(super) fn int(&self, arg: &Fragment) -> Result<String> {
        if let Some(v) = arg.as_int() {
            return Ok(v.to_string());
        }
        let sql = self.num(arg)?;
        Ok(match self.flavor {
            Flavor::Postgresql => format!("({sql})::int"),
            Flavor::Sqlite => sql,
        })
    }

    pub fn binary_op(&self, op: BinaryOp, lhs: Fragment, rhs: Fragment) -> Result<Fragment> {
        use BinaryOp::*;

        match op {
            Concat => self.concat(&[lhs, rhs]),
            Add if lhs.ty == Ty::Text || rhs.ty == Ty::Text => self.concat(&[lhs, rhs]),
            Add | Sub | Mul => {
                let (l, r) = (self.num(&lhs)?, self.num(&rhs)?);
                Ok(Fragment::new(
                    format!("({l} {} {r})", op.as_str()),
                    Ty::Number,
                ))
            }
            Div => {
                let (l, r) = (self.num(&lhs)?, self.num(&rhs)?);
                let sql = match self.flavor {
                    Flavor::Postgresql => format!("(({l})::double precision / NULLIF({r}, 0))"),
                    Flavor::Sqlite => format!("(CAST({l} AS REAL) / NULLIF({r}, 0))"),
                };
                Ok(Fragment::new(sql, Ty::Number))
            }
            Mod => self.modulo(&lhs, &rhs),
            Eq | Ne | Lt | Le | Gt | Ge => {
                let (l, r) = self.comparable(&lhs, &rhs)?;
                let op = if op == Ne { "<>" } else { op.as_str() };
                Ok(Fragment::new(format!("({l} {op} {r})"), Ty::Boolean))
            }
            And | Or => {
                let op = if op == And { "AND" } else { "OR" };
                Ok(Fragment::new(
                    format!("({} {op} {})", self.truthy(&lhs), self.truthy(&rhs)),
                    Ty::Boolean,
                ))
            }
        }
    }

    pub fn unary_op(&self, op: UnaryOp, expr: Fragment) -> Result<Fragment> {
        Ok(match op {
            UnaryOp::Neg => Fragment::new(format!("(-{})", self.num(&expr)?), Ty::Number),
            UnaryOp::Not => Fragment::new(format!("(NOT {})", self.truthy(&expr)), Ty::Boolean),
        })
    }

    pub(super) fn modulo(&self, lhs: &Fragment, rhs: &Fragment) -> Result<Fragment> {
        let (l, r) = (self.num(lhs)?, self.num(rhs)?);
        let sql = match self.flavor {
            Flavor::Postgresql => {
                format!("MOD(({l})::numeric, NULLIF(({r})::numeric, 0))::double precision")
            }
            Flavor::Sqlite => format!("MOD({l}, NULLIF({r}, 0))"),
        };
        Ok(Fragment::new(sql, Ty::Number))
    }

    /// Concatenation: `CONCAT(..)` on PostgreSQL, `||` over `COALESCE`d
    /// operands on SQLite. Both treat `NULL` operands as empty.
    pub(super) fn concat(&self, args: &[Fragment]) -> Result<Fragment> {
        let parts = args
            .iter()
            .map(|arg| self.text(arg))
            .collect::<Result<Vec<_>>>()?;

        let sql = match self.flavor {
            Flavor::Postgresql => {
                if self.generated {
                    return Err(self.unsupported("CONCATENATE"));
                }
                format!("CONCAT({})", parts.join(", "))
            }
            Flavor::Sqlite => {
                let parts: Vec<_> = parts
                    .iter()
                    .map(|part| format!("COALESCE({part}, '')"))
                    .collect();
                format!("({})", parts.join(" || "))
            }
        };
        Ok(Fragment::new(sql, Ty::Text))
    }

    /// Brings two comparison operands to a common type.
    fn comparable(&self, lhs: &Fragment, rhs: &Fragment) -> Result<(String, String)> {
        let numeric = |ty| matches!(ty, Ty::Number | Ty::Boolean);
        if lhs.ty != rhs.ty
            && (numeric(lhs.ty) || numeric(rhs.ty))
            && lhs.ty != Ty::Null
            && rhs.ty != Ty::Null
        {
            return Ok((self.num(lhs)?, self.num(rhs)?));
        }
        Ok((lhs.sql.clone(), rhs.sql.clone()))
    }

    /// Converts branch results to one type. Mixed branches are rendered as
    /// text.
    pub(super) fn unify(&self, branches: &[Fragment]) -> Result<(Vec<String>, Ty)> {
        let mut ty = Ty::Null;
        for branch in branches {
            ty = match (ty, branch.ty) {
                (Ty::Null, other) | (other, Ty::Null) => other,
                (a, b) if a == b => a,
                _ => Ty::Text,
            };
        }

        let sql = branches
            .iter()
            .map(|branch| {
                if ty == Ty::Text && branch.ty != Ty::Text {
                    self.text(branch)
                } else {
                    Ok(branch.sql.clone())
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((sql, ty))
    }
}

fn number_literal(v: f64) -> String {
    if !v.is_finite() {
        "NULL".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        let v = v as i64;
        if v < 0 {
            format!("({v})")
        } else {
            v.to_string()
        }
    } else if v < 0.0 {
        format!("({v})")
    } else {
        v.to_string()
    }
}

/// Quotes a string literal. Both flavors use standard SQL quoting.
pub(super) fn string_literal(v: &str) -> String {
    format!("'{}'", v.replace('\'', "''"))
}
