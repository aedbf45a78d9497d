use super::Statement;

#[derive(Debug, Clone)]
pub struct CreateIndex {
    /// Name of the index
    pub name: String,

    /// Which table to index
    pub on: String,

    /// The columns to index
    pub columns: Vec<String>,

    /// When true, the index is unique
    pub unique: bool,

    pub if_not_exists: bool,
}

impl Statement {
    pub fn create_index(
        name: impl Into<String>,
        on: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        CreateIndex {
            name: name.into(),
            on: on.into(),
            columns,
            unique: false,
            if_not_exists: true,
        }
        .into()
    }
}

impl From<CreateIndex> for Statement {
    fn from(value: CreateIndex) -> Self {
        Self::CreateIndex(value)
    }
}
