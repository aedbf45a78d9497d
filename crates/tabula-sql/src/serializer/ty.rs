use super::{Formatter, Params, ToSql};

use tabula_core::{driver::Flavor, Type};

impl ToSql for Type {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let name = match (f.serializer.flavor, self) {
            (Flavor::Postgresql, Type::Text) => "TEXT",
            (Flavor::Postgresql, Type::Number) => "DOUBLE PRECISION",
            (Flavor::Postgresql, Type::Boolean) => "BOOLEAN",
            (Flavor::Postgresql, Type::DateTime) => "TIMESTAMPTZ",
            (Flavor::Postgresql, Type::Json) => "JSONB",
            (Flavor::Postgresql, Type::Integer) => "BIGINT",
            // SQLite column affinities. Timestamps and JSON are stored as
            // text and decoded by the driver.
            (Flavor::Sqlite, Type::Text | Type::DateTime | Type::Json) => "TEXT",
            (Flavor::Sqlite, Type::Number) => "REAL",
            (Flavor::Sqlite, Type::Boolean | Type::Integer) => "INTEGER",
        };
        f.dst.push_str(name);
    }
}
