use super::{
    FieldId, FormulaOptions, LinkOptions, LookupOptions, RollupOptions, TableId,
};
use crate::{Error, Result, Type};

use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: FieldId,

    /// Table owning the field
    pub table: TableId,

    /// Display name
    pub name: String,

    pub kind: FieldKind,

    /// Storage type of the field's column
    pub ty: Type,

    /// Name of the column storing the field's value
    pub db_column: String,

    /// The value is derived and never written by users directly.
    pub is_computed: bool,

    /// The column is a backend-generated column. Only formula fields are ever
    /// generated; this reflects the storage actually created, which may be a
    /// plain column even when the options asked for a generated one.
    pub db_generated: bool,

    /// Raw JSON options, parsed on demand by the typed accessors.
    pub options: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Plain user-editable scalar
    Stored,
    Formula,
    Lookup,
    Rollup,
    /// Relational link to another table
    Link,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Stored => "stored",
            FieldKind::Formula => "formula",
            FieldKind::Lookup => "lookup",
            FieldKind::Rollup => "rollup",
            FieldKind::Link => "link",
        }
    }

    pub fn parse(name: &str) -> Option<FieldKind> {
        Some(match name {
            "stored" => FieldKind::Stored,
            "formula" => FieldKind::Formula,
            "lookup" => FieldKind::Lookup,
            "rollup" => FieldKind::Rollup,
            "link" => FieldKind::Link,
            _ => return None,
        })
    }

    /// Fields of this kind are recomputed when something they depend on
    /// changes.
    pub fn is_derived(self) -> bool {
        !matches!(self, FieldKind::Stored)
    }

    /// Fields of this kind always hold derived values.
    pub fn is_computed(self) -> bool {
        matches!(
            self,
            FieldKind::Formula | FieldKind::Lookup | FieldKind::Rollup
        )
    }
}

impl Field {
    pub fn is_formula(&self) -> bool {
        self.kind == FieldKind::Formula
    }

    pub fn is_link(&self) -> bool {
        self.kind == FieldKind::Link
    }

    /// A formula whose value the backend maintains as a generated column.
    pub fn is_generated_formula(&self) -> bool {
        self.is_formula() && self.db_generated
    }

    pub fn formula_options(&self) -> Result<FormulaOptions> {
        self.parse_options()
    }

    pub fn link_options(&self) -> Result<LinkOptions> {
        self.parse_options()
    }

    pub fn lookup_options(&self) -> Result<LookupOptions> {
        self.parse_options()
    }

    pub fn rollup_options(&self) -> Result<RollupOptions> {
        self.parse_options()
    }

    /// The link field a lookup or rollup reads through.
    pub fn via_link(&self) -> Result<Option<FieldId>> {
        Ok(match self.kind {
            FieldKind::Lookup => Some(self.lookup_options()?.link_field_id),
            FieldKind::Rollup => Some(self.rollup_options()?.link_field_id),
            _ => None,
        })
    }

    fn parse_options<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.options.as_deref().unwrap_or("null");
        serde_json::from_str(raw).map_err(|err| Error::invalid_options(self.id.as_str(), err))
    }
}
