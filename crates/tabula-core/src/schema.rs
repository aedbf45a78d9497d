mod field;
pub use field::{Field, FieldKind};

mod id;
pub use id::{FieldId, RecordId, TableId};

pub mod options;
pub use options::{
    FormulaOptions, LinkOptions, LookupOptions, Relationship, RollupFunction, RollupOptions,
};

mod reference;
pub use reference::Reference;

mod table;
pub use table::Table;

/// Name of the primary key column carried by every record table.
pub const ID_COLUMN: &str = "__id";

/// Name of the version column carried by every record table.
pub const VERSION_COLUMN: &str = "__version";
