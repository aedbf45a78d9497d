/// SQL dialect spoken by a backend.
///
/// The set is closed: every formula function and statement is matched
/// exhaustively against it, so adding a backend is a compile-time exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    Postgresql,
    Sqlite,
}

impl Flavor {
    pub fn name(self) -> &'static str {
        match self {
            Flavor::Postgresql => "postgresql",
            Flavor::Sqlite => "sqlite",
        }
    }
}

impl core::fmt::Display for Flavor {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct Capability {
    pub flavor: Flavor,

    /// A generated column may reference another generated column in its
    /// defining expression. When false, such references must be expanded
    /// inline before the column is created.
    pub generated_refs_generated: bool,

    /// `ALTER TABLE .. ADD COLUMN .. GENERATED ALWAYS AS (..) STORED` is
    /// accepted. When false, added generated columns are `VIRTUAL`.
    pub add_stored_generated: bool,

    /// `WITH RECURSIVE` is available for closing over the reference relation
    /// in a single query.
    pub recursive_cte: bool,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        flavor: Flavor::Sqlite,
        generated_refs_generated: true,
        // SQLite refuses to add a STORED generated column to an existing
        // table; only VIRTUAL columns may be appended.
        add_stored_generated: false,
        recursive_cte: true,
    };

    /// PostgreSQL capabilities
    pub const POSTGRESQL: Self = Self {
        flavor: Flavor::Postgresql,
        // "cannot use generated column in column generation expression"
        generated_refs_generated: false,
        add_stored_generated: true,
        ..Self::SQLITE
    };

    pub fn is_sqlite(&self) -> bool {
        self.flavor == Flavor::Sqlite
    }

    pub fn is_postgresql(&self) -> bool {
        self.flavor == Flavor::Postgresql
    }
}
