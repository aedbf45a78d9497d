pub mod catalog;
pub use catalog::Catalog;

pub mod change;
pub use change::{CellChange, ChangeSink, ChangedCell, TableChanges};

mod collector;

pub mod config;
pub use config::{Closure, Config, GeneratedColumns};

mod connect;
pub use connect::connect;

pub mod definitions;
pub use definitions::{Definitions, FieldDef};

mod engine;
pub use engine::Engine;

pub mod evaluator;

mod exec;

pub mod graph;
pub use graph::Graph;

pub mod id;

pub mod impact;
pub use impact::{Impact, ImpactSet};

mod link;

pub mod mutation;
pub use mutation::{BaseMutation, InsertRecords, SetLinks, Statements, UpdateCells};

mod orchestrator;
pub use orchestrator::Orchestrator;

mod recompute;
pub use recompute::RecomputeStats;

pub use tabula_core::{
    schema::{Field, FieldId, FieldKind, RecordId, Relationship, RollupFunction, Table, TableId},
    Connection, Error, Result, Type, Value,
};
