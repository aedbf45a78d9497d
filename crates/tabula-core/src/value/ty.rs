use super::Value;
use crate::{Error, Result};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage type of a field's column and of the values read back from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Type {
    Text,
    Number,
    Boolean,
    DateTime,
    Json,
    Integer,
}

impl Type {
    pub fn name(self) -> &'static str {
        match self {
            Type::Text => "text",
            Type::Number => "number",
            Type::Boolean => "boolean",
            Type::DateTime => "dateTime",
            Type::Json => "json",
            Type::Integer => "integer",
        }
    }

    pub fn parse(name: &str) -> Option<Type> {
        Some(match name {
            "text" => Type::Text,
            "number" => Type::Number,
            "boolean" => Type::Boolean,
            "dateTime" => Type::DateTime,
            "json" => Type::Json,
            "integer" => Type::Integer,
            _ => return None,
        })
    }

    /// Converts a raw value decoded by a driver into the domain
    /// representation for this type.
    ///
    /// Drivers decode whatever the backend hands back (SQLite is loosely
    /// typed, so numbers may come back as integers and timestamps as text);
    /// this is the single place where those are normalized.
    pub fn coerce(self, value: Value) -> Result<Value> {
        Ok(match (self, value) {
            (_, Value::Null) => Value::Null,
            (Type::Text, Value::String(v)) => Value::String(v),
            (Type::Text, Value::Number(v)) => Value::String(format_number(v)),
            (Type::Text, Value::Integer(v)) => Value::String(v.to_string()),
            (Type::Text, Value::Bool(v)) => Value::String(v.to_string()),
            (Type::Text, Value::DateTime(v)) => Value::String(v.to_rfc3339()),
            (Type::Number, Value::Number(v)) => Value::Number(v),
            (Type::Number, Value::Integer(v)) => Value::Number(v as f64),
            (Type::Number, Value::Bool(v)) => Value::Number(if v { 1.0 } else { 0.0 }),
            (Type::Number, Value::String(v)) => match v.trim().parse::<f64>() {
                Ok(v) => Value::Number(v),
                Err(_) => return Err(Error::type_conversion(v, "number")),
            },
            (Type::Integer, Value::Integer(v)) => Value::Integer(v),
            (Type::Integer, Value::Number(v)) if v.fract() == 0.0 => Value::Integer(v as i64),
            (Type::Boolean, Value::Bool(v)) => Value::Bool(v),
            (Type::Boolean, Value::Integer(v)) => Value::Bool(v != 0),
            (Type::Boolean, Value::Number(v)) => Value::Bool(v != 0.0),
            (Type::DateTime, Value::DateTime(v)) => Value::DateTime(v),
            (Type::DateTime, Value::String(v)) => Value::DateTime(parse_datetime(&v)?),
            (Type::Json, Value::Json(v)) => Value::from_json(v),
            (Type::Json, Value::String(v)) => Value::from_json(serde_json::from_str(&v)?),
            (ty, value) => return Err(Error::type_conversion(value, ty.name())),
        })
    }
}

/// Parses the timestamp shapes the backends produce: RFC 3339, and SQLite's
/// `YYYY-MM-DD HH:MM:SS[.fff]` (interpreted as UTC).
pub fn parse_datetime(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(v) = DateTime::parse_from_rfc3339(text) {
        return Ok(v.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))?;
    Ok(naive.and_utc())
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}
