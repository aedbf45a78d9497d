use chrono::{DateTime, NaiveDateTime, Utc};
use postgres_types::{accepts, private::BytesMut, to_sql_checked, IsNull, ToSql, Type};
use tabula_core::{
    err, value::parse_datetime, Error, Result, Type as CoreType, Value as CoreValue,
};
use tokio_postgres::Row;

type BoxError = Box<dyn std::error::Error + Sync + Send>;

#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        // Parameter types are inferred by the server from the statement, so
        // each value converts to whatever column type it lands in.
        match &self.0 {
            CoreValue::Null => Ok(IsNull::Yes),
            CoreValue::Bool(value) => match *ty {
                Type::BOOL => value.to_sql(ty, out),
                Type::JSON | Type::JSONB => serde_json::Value::Bool(*value).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => value.to_string().to_sql(ty, out),
                _ => mismatch(&self.0, ty),
            },
            CoreValue::Number(value) => match *ty {
                Type::FLOAT8 => value.to_sql(ty, out),
                Type::FLOAT4 => (*value as f32).to_sql(ty, out),
                Type::INT8 if value.fract() == 0.0 => (*value as i64).to_sql(ty, out),
                Type::INT4 if value.fract() == 0.0 => (*value as i32).to_sql(ty, out),
                Type::JSON | Type::JSONB => serde_json::json!(value).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => value.to_string().to_sql(ty, out),
                _ => mismatch(&self.0, ty),
            },
            CoreValue::Integer(value) => match *ty {
                Type::INT8 => value.to_sql(ty, out),
                Type::INT4 => i32::try_from(*value)?.to_sql(ty, out),
                Type::INT2 => i16::try_from(*value)?.to_sql(ty, out),
                Type::FLOAT8 => (*value as f64).to_sql(ty, out),
                Type::JSON | Type::JSONB => serde_json::json!(value).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => value.to_string().to_sql(ty, out),
                _ => mismatch(&self.0, ty),
            },
            CoreValue::String(value) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => value.to_sql(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::Value::String(value.clone()).to_sql(ty, out)
                }
                Type::TIMESTAMPTZ => parse_datetime(value)?.to_sql(ty, out),
                Type::FLOAT8 => value.trim().parse::<f64>()?.to_sql(ty, out),
                _ => mismatch(&self.0, ty),
            },
            CoreValue::DateTime(value) => match *ty {
                Type::TIMESTAMPTZ => value.to_sql(ty, out),
                Type::TIMESTAMP => value.naive_utc().to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => value.to_rfc3339().to_sql(ty, out),
                _ => mismatch(&self.0, ty),
            },
            CoreValue::Json(value) => match *ty {
                Type::JSON | Type::JSONB => value.to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => value.to_string().to_sql(ty, out),
                _ => mismatch(&self.0, ty),
            },
        }
    }

    accepts!(
        BOOL,
        INT2,
        INT4,
        INT8,
        FLOAT4,
        FLOAT8,
        TEXT,
        VARCHAR,
        BPCHAR,
        NAME,
        TIMESTAMP,
        TIMESTAMPTZ,
        JSON,
        JSONB
    );
    to_sql_checked!();
}

fn mismatch(value: &CoreValue, ty: &Type) -> std::result::Result<IsNull, BoxError> {
    Err(format!("cannot bind {value:?} to a parameter of type {ty}").into())
}

/// Decodes column `index` of `row` by its PostgreSQL type, then coerces it
/// to `ty`.
pub(crate) fn from_row(row: &Row, index: usize, ty: CoreType) -> Result<CoreValue> {
    let Some(column) = row.columns().get(index) else {
        return Err(err!("missing column {index}; columns={}", row.len()));
    };
    let pg = column.type_();

    let raw = if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(pg) {
        CoreValue::from(get::<String>(row, index)?)
    } else if *pg == Type::BOOL {
        CoreValue::from(get::<bool>(row, index)?)
    } else if *pg == Type::INT2 {
        CoreValue::from(get::<i16>(row, index)?.map(i64::from))
    } else if *pg == Type::INT4 {
        CoreValue::from(get::<i32>(row, index)?.map(i64::from))
    } else if *pg == Type::INT8 {
        CoreValue::from(get::<i64>(row, index)?)
    } else if *pg == Type::FLOAT4 {
        CoreValue::from(get::<f32>(row, index)?.map(f64::from))
    } else if *pg == Type::FLOAT8 {
        CoreValue::from(get::<f64>(row, index)?)
    } else if *pg == Type::TIMESTAMPTZ {
        CoreValue::from(get::<DateTime<Utc>>(row, index)?)
    } else if *pg == Type::TIMESTAMP {
        CoreValue::from(get::<NaiveDateTime>(row, index)?.map(|v| v.and_utc()))
    } else if *pg == Type::JSON || *pg == Type::JSONB {
        match get::<serde_json::Value>(row, index)? {
            Some(json) => CoreValue::Json(json),
            None => CoreValue::Null,
        }
    } else {
        return Err(err!(
            "unsupported PostgreSQL column type; column={}; type={pg}",
            column.name()
        ));
    };

    ty.coerce(raw)
}

fn get<'a, T>(row: &'a Row, index: usize) -> Result<Option<T>>
where
    T: postgres_types::FromSql<'a>,
{
    row.try_get::<usize, Option<T>>(index).map_err(Error::driver)
}
