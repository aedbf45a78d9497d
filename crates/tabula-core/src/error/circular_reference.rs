use super::Error;

/// Error when a field's dependencies loop back onto themselves.
///
/// Raised at definition time, either by the expansion pass (the field shows
/// up in its own expansion stack) or by the reference graph when inserting
/// the new edges would close a cycle.
#[derive(Debug)]
pub(super) struct CircularReferenceError {
    /// Field being defined or expanded.
    field: Box<str>,

    /// Field at which the cycle was detected.
    at: Box<str>,
}

impl std::error::Error for CircularReferenceError {}

impl core::fmt::Display for CircularReferenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.field == self.at {
            write!(f, "circular reference: field `{}` depends on itself", self.field)
        } else {
            write!(
                f,
                "circular reference: field `{}` forms a cycle at field `{}`",
                self.field, self.at
            )
        }
    }
}

impl Error {
    /// Creates a circular reference error.
    pub fn circular_reference(field: impl Into<String>, at: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::CircularReference(CircularReferenceError {
            field: field.into().into(),
            at: at.into().into(),
        }))
    }

    /// Returns `true` if this error is (or was caused by) a circular reference.
    pub fn is_circular_reference(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::CircularReference(_)))
    }
}
