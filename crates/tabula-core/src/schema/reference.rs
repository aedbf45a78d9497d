use super::FieldId;

/// A persisted dependency edge: `to`'s value depends on `from`'s value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub from: FieldId,
    pub to: FieldId,
}

impl Reference {
    pub fn new(from: impl Into<FieldId>, to: impl Into<FieldId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
