//! Typed option payloads stored as JSON on each field.

use super::{FieldId, TableId};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaOptions {
    pub expression: String,

    /// Ask for the value to be persisted as a backend-generated column.
    #[serde(default)]
    pub db_generated: bool,

    /// Refuse the plain-column fallback when a generated column is not
    /// possible.
    #[serde(default, skip_serializing_if = "is_false")]
    pub require_generated: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Describes where a link's pairs are stored.
///
/// Rows of `fk_host_table_name` whose `self_key_name` column holds a host
/// record id carry a linked foreign record id in `foreign_key_name`. This
/// covers a junction table (many-to-many) as well as a foreign key column
/// hosted on either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOptions {
    pub relationship: Relationship,

    pub foreign_table_id: TableId,

    /// Foreign field rendered as the title of each linked record
    pub lookup_field_id: FieldId,

    pub fk_host_table_name: String,

    pub self_key_name: String,

    pub foreign_key_name: String,

    /// Mirrored link field on the foreign table, if the link is two-way
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetric_field_id: Option<FieldId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relationship {
    ManyMany,
    ManyOne,
    OneMany,
    OneOne,
}

impl Relationship {
    /// Cardinality of the mirrored field on the foreign table.
    pub fn symmetric(self) -> Relationship {
        match self {
            Relationship::ManyMany => Relationship::ManyMany,
            Relationship::ManyOne => Relationship::OneMany,
            Relationship::OneMany => Relationship::ManyOne,
            Relationship::OneOne => Relationship::OneOne,
        }
    }

    /// At most one foreign record per host record.
    pub fn is_single(self) -> bool {
        matches!(self, Relationship::ManyOne | Relationship::OneOne)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOptions {
    pub link_field_id: FieldId,
    pub foreign_table_id: TableId,
    pub lookup_field_id: FieldId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupOptions {
    pub link_field_id: FieldId,
    pub foreign_table_id: TableId,
    pub lookup_field_id: FieldId,
    pub function: RollupFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollupFunction {
    Sum,
    Average,
    Max,
    Min,
    /// Number of linked records
    Count,
    /// Number of non-empty looked-up values
    Counta,
    Concatenate,
}
