use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};
use tabula_core::{err, Error, Result, Type, Value as CoreValue};

/// Timestamps are stored as text in the same shape `STRFTIME('%Y-%m-%dT%H:%M:%fZ')`
/// produces, so stored and computed values compare as strings.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    /// Converts this SQLite driver value into the core value.
    pub fn into_inner(self) -> CoreValue {
        self.0
    }

    /// Reads column `index` of `row` and coerces it to `ty`.
    pub fn from_sql(row: &Row, index: usize, ty: Type) -> Result<Self> {
        let value = row.get_ref(index).map_err(Error::driver)?;

        let raw = match value {
            ValueRef::Null => CoreValue::Null,
            ValueRef::Integer(value) => CoreValue::Integer(value),
            ValueRef::Real(value) => CoreValue::Number(value),
            ValueRef::Text(value) => CoreValue::String(
                std::str::from_utf8(value)
                    .map_err(|e| err!("column {index} is not valid UTF-8; {e}"))?
                    .to_string(),
            ),
            ValueRef::Blob(_) => {
                return Err(err!("unexpected blob in column {index}; ty={}", ty.name()))
            }
        };

        Ok(Value(ty.coerce(raw)?))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match &self.0 {
            CoreValue::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            CoreValue::Bool(true) => Ok(ToSqlOutput::Owned(SqlValue::Integer(1))),
            CoreValue::Bool(false) => Ok(ToSqlOutput::Owned(SqlValue::Integer(0))),
            CoreValue::Number(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            CoreValue::Integer(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            CoreValue::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            CoreValue::DateTime(v) => Ok(ToSqlOutput::Owned(SqlValue::Text(
                v.format(DATETIME_FORMAT).to_string(),
            ))),
            CoreValue::Json(v) => Ok(ToSqlOutput::Owned(SqlValue::Text(v.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn datetimes_bind_as_iso_text() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let value = Value::from(CoreValue::DateTime(at));
        let ToSqlOutput::Owned(SqlValue::Text(text)) = value.to_sql().unwrap() else {
            panic!("expected owned text");
        };
        assert_eq!(text, "2024-03-01T10:00:00.000Z");
    }
}
