use tabula_core::schema::{FieldId, RecordId, TableId};
use uuid::Uuid;

fn generate(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

pub fn table_id() -> TableId {
    TableId::new(generate(TableId::PREFIX))
}

pub fn field_id() -> FieldId {
    FieldId::new(generate(FieldId::PREFIX))
}

pub fn record_id() -> RecordId {
    RecordId::new(generate(RecordId::PREFIX))
}

/// Key of a junction row; never exposed to callers.
pub(crate) fn junction_row_id() -> String {
    generate("jnc")
}
