use super::TableId;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: TableId,

    /// Display name
    pub name: String,

    /// Name of the backing relation in the database
    pub db_table_name: String,
}
