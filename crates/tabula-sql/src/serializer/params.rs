use super::{Formatter, ToSql};

use tabula_core::{driver::Flavor, Value};

pub trait Params {
    fn push(&mut self, param: &Value) -> Placeholder;
}

pub struct Placeholder(pub usize);

impl Params for Vec<Value> {
    fn push(&mut self, value: &Value) -> Placeholder {
        self.push(value.clone());
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let placeholder = match f.serializer.flavor {
            Flavor::Postgresql => format!("${}", self.0),
            Flavor::Sqlite => format!("?{}", self.0),
        };
        f.dst.push_str(&placeholder);
    }
}
