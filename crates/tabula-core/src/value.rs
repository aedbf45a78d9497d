mod ty;
pub use ty::{parse_datetime, Type};

use chrono::{DateTime, Utc};

/// A cell value as seen by the domain.
///
/// Array-shaped values (link cells, lookups) are carried as JSON. Equality is
/// deep, which is what change suppression relies on.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Numeric cell value
    Number(f64),

    /// Signed 64-bit integer, used for system columns such as `__version`
    Integer(i64),

    /// Text value
    String(String),

    /// Point in time, always UTC
    DateTime(DateTime<Utc>),

    /// Structured value: arrays of looked-up values, link objects
    Json(serde_json::Value),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Number(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Builds a cell value from decoded JSON.
    ///
    /// Empty arrays and JSON `null` both become [`Value::Null`] so that a cell
    /// with no linked records compares equal across backends. Integral floats
    /// are normalized to integers for the same reason (`1.0` from SQLite's
    /// `REAL` columns, `1` from PostgreSQL's `jsonb`).
    pub fn from_json(json: serde_json::Value) -> Self {
        match normalize_json(json) {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Array(items) if items.is_empty() => Self::Null,
            json => Self::Json(json),
        }
    }
}

fn normalize_json(json: serde_json::Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match json {
        Json::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 9e15 => {
                Json::from(f as i64)
            }
            _ => Json::Number(n),
        },
        Json::Array(items) => Json::Array(items.into_iter().map(normalize_json).collect()),
        Json::Object(map) => Json::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_json(value)))
                .collect(),
        ),
        json => json,
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(value)
    }
}

impl<T> From<Option<T>> for Value
where
    Value: From<T>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Value::from(value),
            None => Value::Null,
        }
    }
}
