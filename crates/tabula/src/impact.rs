use indexmap::{IndexMap, IndexSet};
use tabula_core::schema::{FieldId, RecordId, TableId};

/// Fields and records of one table that need recomputing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Impact {
    pub fields: IndexSet<FieldId>,
    pub records: IndexSet<RecordId>,
}

/// The request-scoped mapping of table to impacted fields and records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImpactSet {
    tables: IndexMap<TableId, Impact>,
}

impl Impact {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() || self.records.is_empty()
    }
}

impl ImpactSet {
    pub fn new() -> ImpactSet {
        ImpactSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Impact::is_empty)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn get(&self, table: &TableId) -> Option<&Impact> {
        self.tables.get(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableId, &Impact)> {
        self.tables.iter()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableId> {
        self.tables.keys()
    }

    /// Every impacted field, across tables.
    pub fn fields(&self) -> IndexSet<FieldId> {
        self.tables
            .values()
            .flat_map(|impact| impact.fields.iter().cloned())
            .collect()
    }

    pub fn entry(&mut self, table: TableId) -> &mut Impact {
        self.tables.entry(table).or_default()
    }

    pub fn insert(
        &mut self,
        table: TableId,
        fields: impl IntoIterator<Item = FieldId>,
        records: impl IntoIterator<Item = RecordId>,
    ) {
        let impact = self.entry(table);
        impact.fields.extend(fields);
        impact.records.extend(records);
    }

    /// Unions `other` into `self`.
    pub fn merge(&mut self, other: ImpactSet) {
        for (table, impact) in other.tables {
            self.insert(table, impact.fields, impact.records);
        }
    }

    /// Removes the given fields from every table.
    pub fn exclude(&mut self, fields: &IndexSet<FieldId>) {
        for impact in self.tables.values_mut() {
            impact.fields.retain(|field| !fields.contains(field));
        }
    }

    /// Drops tables that lack either fields or records.
    pub fn prune(&mut self) {
        self.tables.retain(|_, impact| !impact.is_empty());
    }
}
