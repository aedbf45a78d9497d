use tabula_core::{
    schema::{FieldId, RecordId, TableId},
    Value,
};

/// A cell written directly by a base mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangedCell {
    pub table: TableId,
    pub record: RecordId,
    pub field: FieldId,
}

/// One derived value that changed during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CellChange {
    pub record_id: RecordId,
    pub field_id: FieldId,
    pub old_value: Value,
    pub new_value: Value,

    /// Version of the record as stored after the run
    pub version: i64,
}

/// Changes emitted for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableChanges {
    pub table_id: TableId,
    pub changes: Vec<CellChange>,
}

/// Receives the derived changes of a run, once per table with changes.
pub trait ChangeSink: Send {
    fn emit(&mut self, table: &TableId, changes: Vec<CellChange>);
}

impl ChangedCell {
    pub fn new(
        table: impl Into<TableId>,
        record: impl Into<RecordId>,
        field: impl Into<FieldId>,
    ) -> ChangedCell {
        ChangedCell {
            table: table.into(),
            record: record.into(),
            field: field.into(),
        }
    }
}

impl ChangeSink for Vec<TableChanges> {
    fn emit(&mut self, table: &TableId, changes: Vec<CellChange>) {
        self.push(TableChanges {
            table_id: table.clone(),
            changes,
        });
    }
}

impl<S: ChangeSink + ?Sized> ChangeSink for &mut S {
    fn emit(&mut self, table: &TableId, changes: Vec<CellChange>) {
        (**self).emit(table, changes)
    }
}

impl TableChanges {
    /// The change of one cell, if any.
    pub fn get(&self, record: &RecordId, field: &FieldId) -> Option<&CellChange> {
        self.changes
            .iter()
            .find(|change| change.record_id == *record && change.field_id == *field)
    }
}
