use serde::{Deserialize, Serialize};

macro_rules! ids {
    ( $( $(#[$attr:meta])* $name:ident => $prefix:literal; )* ) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl $name {
                /// Prefix used when generating fresh identifiers.
                pub const PREFIX: &'static str = $prefix;

                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl core::fmt::Display for $name {
                fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }

            impl core::borrow::Borrow<str> for $name {
                fn borrow(&self) -> &str {
                    &self.0
                }
            }
        )*
    };
}

ids! {
    /// Identifies a table across the whole system.
    TableId => "tbl";

    /// Identifies a field across the whole system (not just one table).
    FieldId => "fld";

    /// Identifies a record within its table.
    RecordId => "rec";
}
